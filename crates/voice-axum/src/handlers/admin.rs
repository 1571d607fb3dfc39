//! Operator-facing endpoint for queuing an outbound dial (§4.13).
//!
//! Auth is a direct `Authorization: Bearer <token>` string comparison,
//! inlined here since this is the one endpoint that needs it rather than a
//! whole-router middleware layer.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use voice_orchestrator::DialRequest;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueDialRequest {
    pub to: String,
    pub agent_id: String,
}

fn is_authorized(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|h| h == format!("Bearer {expected}"))
        .unwrap_or(false)
}

pub async fn enqueue_dial(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EnqueueDialRequest>,
) -> impl IntoResponse {
    if !is_authorized(&headers, &state.admin_api_key) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state
        .dialer
        .enqueue(DialRequest { to: body.to, agent_id: body.agent_id })
        .await;
    StatusCode::ACCEPTED.into_response()
}
