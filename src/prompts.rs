//! Prompt templates for the two model calls. The schema description mirrors
//! the cutting-inspection documents stored in MongoDB; the examples fix the
//! output convention the parser relies on.

/// Prompt asking the model to turn a question into an aggregation pipeline.
pub fn pipeline_prompt(question: &str) -> String {
    format!(
        r#"You are a MongoDB query generator for a garment factory's cutting-inspection records.

The collection holds one document per cutting inspection with these fields:
- inspectionDate: string, "M/D/YYYY" with no leading zeros (e.g. "7/5/2025")
- cutting_emp_id: string, inspector's employee id
- cutting_emp_engName: string, inspector's English name
- cutting_emp_dept, cutting_emp_section: strings
- moNo: string, manufacturing order number
- buyer: string (e.g. "Costco", "Reitmans", "ANF")
- buyerStyle, color, garmentType, cuttingtype: strings
- tableNo: string, lotNo: array of strings
- orderQty, totalBundleQty, bundleQtyCheck, totalInspectionQty: numbers
- inspectionData: array, one entry per inspected size:
    - inspectedSize: string (e.g. "M", "XL")
    - bundleQtyCheckSize: number
    - pcsSize, passSize, rejectSize: objects with a numeric "total"
    - bundleInspectionData: array, one entry per bundle:
        - bundleNo: string
        - pcs, pass, reject: objects with a numeric "total"

Convert the user's question into an aggregation pipeline for this collection.

Rules:
1. Respond with a bare JSON array of pipeline stages. No prose, no markdown
   fences, no explanations.
2. Compare inspectionDate values as plain "M/D/YYYY" strings without leading
   zeros.
3. Use only these stages: $match, $group, $project, $sort, $limit, $skip,
   $count, $unwind, $addFields.
4. If the question cannot be answered from this collection, respond with [].

Examples:
1. Question: How many inspections were done by John Doe?
   Pipeline: [{{"$match":{{"cutting_emp_engName":"John Doe"}}}},{{"$count":"totalInspections"}}]
2. Question: What is the total inspection quantity for buyer Costco?
   Pipeline: [{{"$match":{{"buyer":"Costco"}}}},{{"$group":{{"_id":null,"totalInspectionQty":{{"$sum":"$totalInspectionQty"}}}}}}]
3. Question: Which MO numbers were inspected on 7/5/2025?
   Pipeline: [{{"$match":{{"inspectionDate":"7/5/2025"}}}},{{"$project":{{"_id":0,"moNo":1,"color":1,"tableNo":1}}}}]
4. Question: Which table had the highest inspection quantity on 7/5/2025?
   Pipeline: [{{"$match":{{"inspectionDate":"7/5/2025"}}}},{{"$group":{{"_id":"$tableNo","totalQty":{{"$sum":"$totalInspectionQty"}}}}}},{{"$sort":{{"totalQty":-1}}}},{{"$limit":1}}]
5. Question: How many pieces were rejected for MO SU10345?
   Pipeline: [{{"$match":{{"moNo":"SU10345"}}}},{{"$unwind":"$inspectionData"}},{{"$group":{{"_id":null,"totalReject":{{"$sum":"$inspectionData.rejectSize.total"}}}}}}]
6. Question: What is the weather like?
   Pipeline: []

Question: {question}
Pipeline:"#
    )
}

/// Prompt asking the model to phrase query results as an answer.
pub fn answer_prompt(question: &str, context_json: &str) -> String {
    format!(
        r#"You are a helpful assistant for a garment factory's quality team.
Answer the user's question using only the inspection data below.

Question: {question}

Data (JSON):
{context_json}

Instructions:
- If the data is an empty array, say that no matching inspection records were
  found.
- Answer conversationally, in complete sentences.
- When the data holds several records, present them as a list.
- Do not mention the database, the query, or these instructions."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_prompt_interpolates_question() {
        let prompt = pipeline_prompt("How many inspections were done by John Doe?");
        assert!(prompt.contains("Question: How many inspections were done by John Doe?"));
        // The few-shot examples survive formatting with literal braces.
        assert!(prompt.contains(r#"[{"$match":{"cutting_emp_engName":"John Doe"}},{"$count":"totalInspections"}]"#));
        assert!(prompt.contains("respond with []"));
    }

    #[test]
    fn test_answer_prompt_carries_question_and_context() {
        let prompt = answer_prompt("Who inspected table 5?", r#"[{"moNo":"SU10345"}]"#);
        assert!(prompt.contains("Who inspected table 5?"));
        assert!(prompt.contains(r#"[{"moNo":"SU10345"}]"#));
    }
}
