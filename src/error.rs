use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::llm::ModelError;
use crate::store::StoreError;

/// Failures a request can surface. Everything that escapes the handler is
/// one of these; the conversion to an HTTP response happens in exactly one
/// place.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No question provided")]
    EmptyQuestion,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyQuestion => StatusCode::BAD_REQUEST,
            AppError::Model(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
