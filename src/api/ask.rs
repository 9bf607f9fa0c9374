use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::pipeline::{self, PipelineParse};
use crate::preprocess;
use crate::prompts;
use crate::store;
use crate::AppState;

#[derive(Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, rename = "selectedModel")]
    pub selected_model: Option<String>,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    /// Model that actually answered; differs from the selector when an
    /// unconfigured cloud model was requested.
    pub model: String,
}

/// POST /ask — answer a natural-language question about inspection records.
///
/// The request runs strictly sequentially: preprocess, generate a pipeline,
/// parse it defensively, query, then phrase the answer. A malformed
/// generation degrades to "no data"; database and model failures surface as
/// a 500 through [`AppError`].
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = request.question.as_deref().unwrap_or("").trim();
    if question.is_empty() {
        return Err(AppError::EmptyQuestion);
    }

    let model = state.resolve_model(request.selected_model.as_deref());
    info!(model = model.id(), "answering question");

    let prepared = preprocess::expand_relative_dates_now(question);

    let raw_pipeline = model.generate(&prompts::pipeline_prompt(&prepared)).await?;
    debug!(%raw_pipeline, "model pipeline reply");

    let stages = match pipeline::parse_pipeline(&raw_pipeline) {
        PipelineParse::Parsed(stages) => stages,
        PipelineParse::Unparseable(reason) => {
            warn!("unusable pipeline from model, continuing without data: {reason}");
            Vec::new()
        }
    };
    let stages = match pipeline::check_stages(&stages) {
        Ok(()) => stages,
        Err(reason) => {
            warn!("rejected generated pipeline, continuing without data: {reason}");
            Vec::new()
        }
    };

    let documents = if stages.is_empty() {
        Vec::new()
    } else {
        state.store.run_pipeline(stages).await?
    };
    let context = store::context_json(&documents);

    // The answer prompt gets the original question, not the preprocessed one.
    let answer = model
        .generate(&prompts::answer_prompt(question, &context))
        .await?;

    Ok(Json(AskResponse {
        answer,
        model: model.id().to_string(),
    }))
}
