pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod preprocess;
pub mod prompts;
pub mod store;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::AppConfig;
use crate::llm::LanguageModel;
use crate::store::InspectionStore;

/// Long-lived request dependencies, built once in `main` and cloned per
/// request. Handlers only see this struct, so tests inject doubles for the
/// model clients and the store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub local_model: Arc<dyn LanguageModel>,
    pub gemini_model: Option<Arc<dyn LanguageModel>>,
    pub store: Arc<dyn InspectionStore>,
}

impl AppState {
    /// Resolve the caller's model selector. An unavailable or unknown
    /// selection degrades to the local model; the substitution is logged and
    /// the effective model id travels back in the response.
    pub fn resolve_model(&self, selected: Option<&str>) -> Arc<dyn LanguageModel> {
        match selected {
            Some(name) if name.eq_ignore_ascii_case("gemini") => match &self.gemini_model {
                Some(gemini) => gemini.clone(),
                None => {
                    warn!(
                        "gemini model requested but not configured, answering with {}",
                        self.local_model.id()
                    );
                    self.local_model.clone()
                }
            },
            _ => self.local_model.clone(),
        }
    }
}

/// Build the router. Shared with the integration tests so they drive the
/// exact production routing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/ask", post(api::ask::ask))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": "inspection-chatbot-backend"
    })))
}
