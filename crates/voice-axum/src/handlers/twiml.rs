//! Twilio incoming-call webhook (§6).
//!
//! Twilio calls this endpoint (GET or POST, it never cares which) when a
//! call lands on the configured number, and expects back a TwiML document
//! telling it what to do. `<Connect><Stream>` hands the call's audio off to
//! our media-stream WebSocket for the rest of its life.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

pub async fn twiml(State(state): State<AppState>) -> Response {
    let url = format!("wss://{}/ws/media-stream?client=twilio", state.public_host);
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Response><Connect><Stream url=\"{url}\"/></Connect></Response>"
    );
    ([("content-type", "text/xml")], body).into_response()
}
