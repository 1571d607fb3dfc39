//! Axum-specific error type and its mapping to HTTP status codes.
//!
//! An `IntoResponse`/`From<Inner>` chaining pattern, narrowed to the
//! handful of failure modes this adapter actually produces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use voice_orchestrator::OrchestratorError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            HttpError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Orchestrator(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorBody { error: self.to_string(), status: status.as_u16() };
        (status, axum::Json(body)).into_response()
    }
}
