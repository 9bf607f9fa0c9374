use bson::Document;
use serde_json::Value;

/// Outcome of parsing a model reply as an aggregation pipeline. The caller
/// decides what a failure degrades to; the parser only reports it.
#[derive(Debug)]
pub enum PipelineParse {
    Parsed(Vec<Document>),
    Unparseable(String),
}

/// Stages the generated pipeline is allowed to use. Everything that writes,
/// crosses collections, or runs server-side JS is rejected.
const ALLOWED_STAGES: &[&str] = &[
    "$match",
    "$group",
    "$project",
    "$sort",
    "$limit",
    "$skip",
    "$count",
    "$unwind",
    "$addFields",
];

/// Parse raw model text into pipeline stages.
///
/// Tolerates a markdown code fence around the JSON (the prompt forbids it,
/// but the convention is not a guarantee) and coerces a lone stage object
/// into a one-element pipeline.
pub fn parse_pipeline(raw: &str) -> PipelineParse {
    let text = strip_code_fence(raw.trim());

    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(v) => v,
        Err(e) => return PipelineParse::Unparseable(format!("invalid JSON: {e}")),
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return PipelineParse::Unparseable(format!(
                "expected a JSON array of stages, got {}",
                type_name(&other)
            ))
        }
    };

    let mut stages = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            return PipelineParse::Unparseable(format!(
                "pipeline stage must be an object, got {}",
                type_name(&item)
            ));
        }
        match bson::to_document(&item) {
            Ok(doc) => stages.push(doc),
            Err(e) => {
                return PipelineParse::Unparseable(format!("stage is not a valid document: {e}"))
            }
        }
    }
    PipelineParse::Parsed(stages)
}

/// Verify every stage is on the allow-list. The generated pipeline runs
/// against production data, so unknown operators never reach the server.
pub fn check_stages(pipeline: &[Document]) -> Result<(), String> {
    for stage in pipeline {
        if stage.len() != 1 {
            return Err(format!(
                "stage must hold exactly one operator, found {}",
                stage.len()
            ));
        }
        // len() == 1 above guarantees a first key.
        let name = stage.keys().next().map(String::as_str).unwrap_or("");
        if !ALLOWED_STAGES.contains(&name) {
            return Err(format!("stage {name} is not allowed"));
        }
    }
    Ok(())
}

/// Keep only the content between the first pair of ``` fences, dropping an
/// optional language tag. Text without a fence passes through untouched.
fn strip_code_fence(text: &str) -> &str {
    let fence = match regex::Regex::new(r"(?s)```(?:json)?\s*(.+?)\s*```") {
        Ok(re) => re,
        Err(_) => return text,
    };
    match fence.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn parsed(raw: &str) -> Vec<Document> {
        match parse_pipeline(raw) {
            PipelineParse::Parsed(stages) => stages,
            PipelineParse::Unparseable(reason) => panic!("expected parse, got: {reason}"),
        }
    }

    #[test]
    fn test_bare_array_parses() {
        let stages = parsed(r#"[{"$match":{"buyer":"Costco"}},{"$count":"total"}]"#);
        assert_eq!(
            stages,
            vec![
                doc! {"$match": {"buyer": "Costco"}},
                doc! {"$count": "total"},
            ]
        );
    }

    #[test]
    fn test_empty_array_parses_to_empty_pipeline() {
        assert!(parsed("[]").is_empty());
        assert!(parsed("  []  ").is_empty());
    }

    #[test]
    fn test_code_fence_is_stripped() {
        let raw = "```json\n[{\"$match\":{\"moNo\":\"SU10345\"}}]\n```";
        let stages = parsed(raw);
        assert_eq!(stages, vec![doc! {"$match": {"moNo": "SU10345"}}]);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n[{\"$limit\": 5}]\n```";
        let stages = parsed(raw);
        assert_eq!(stages.len(), 1);
        assert!(stages[0].contains_key("$limit"));
    }

    #[test]
    fn test_prose_around_fence_is_discarded() {
        let raw = "Here is your pipeline:\n```json\n[{\"$match\":{\"tableNo\":\"T5\"}}]\n```\nLet me know!";
        assert_eq!(parsed(raw), vec![doc! {"$match": {"tableNo": "T5"}}]);
    }

    #[test]
    fn test_single_object_is_wrapped() {
        let stages = parsed(r#"{"$match":{"color":"BLACK"}}"#);
        assert_eq!(stages, vec![doc! {"$match": {"color": "BLACK"}}]);
    }

    #[test]
    fn test_invalid_json_is_reported_not_thrown() {
        match parse_pipeline("I cannot answer that question.") {
            PipelineParse::Unparseable(reason) => assert!(reason.contains("invalid JSON")),
            PipelineParse::Parsed(_) => panic!("prose must not parse"),
        }
    }

    #[test]
    fn test_scalar_array_elements_are_rejected() {
        match parse_pipeline(r#"["$match", 1]"#) {
            PipelineParse::Unparseable(reason) => assert!(reason.contains("must be an object")),
            PipelineParse::Parsed(_) => panic!("scalars are not stages"),
        }
    }

    #[test]
    fn test_top_level_scalar_is_rejected() {
        assert!(matches!(
            parse_pipeline("42"),
            PipelineParse::Unparseable(_)
        ));
    }

    #[test]
    fn test_allowed_stages_pass_the_guard() {
        let pipeline = vec![
            doc! {"$match": {"buyer": "Costco"}},
            doc! {"$unwind": "$inspectionData"},
            doc! {"$group": {"_id": null, "total": {"$sum": "$totalInspectionQty"}}},
            doc! {"$sort": {"total": -1}},
            doc! {"$limit": 10},
        ];
        assert!(check_stages(&pipeline).is_ok());
    }

    #[test]
    fn test_write_and_lookup_stages_are_rejected() {
        for stage in [
            doc! {"$out": "stolen"},
            doc! {"$merge": {"into": "stolen"}},
            doc! {"$lookup": {"from": "users", "as": "u", "localField": "a", "foreignField": "b"}},
        ] {
            assert!(check_stages(&[stage]).is_err());
        }
    }

    #[test]
    fn test_multi_operator_stage_is_rejected() {
        let stage = doc! {"$match": {}, "$limit": 1};
        assert!(check_stages(&[stage]).is_err());
    }

    #[test]
    fn test_empty_pipeline_passes_the_guard() {
        assert!(check_stages(&[]).is_ok());
    }
}
