//! WebSocket upgrade handler for the browser client.
//!
//! `GET /ws/browser?agent_id=...` -- inbound audio is 16kHz linear PCM sent
//! as base64 `{"type":"audio","data":...}` text frames (§6); there is no
//! `start`/`stop` handshake like the telephony carriers, so the call starts
//! as soon as the socket upgrades and ends when it closes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use voice_core::domain::{AudioEncoding, AudioFormat, AudioFrame, CarrierKind};
use voice_core::AudioTransport;
use voice_orchestrator::OrchestratorDeps;
use voice_transport::BrowserTransport;

use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct BrowserParams {
    pub agent_id: Option<String>,
}

pub async fn browser_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<BrowserParams>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_browser_socket(socket, state, params))
}

async fn handle_browser_socket(socket: WebSocket, state: AppState, params: BrowserParams) {
    let call_id = Uuid::new_v4().to_string();
    let agent_id = params.agent_id.unwrap_or_else(|| state.default_agent_id.clone());

    let (transport, mut out_rx) = BrowserTransport::new();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut egress = tokio::spawn(async move {
        while let Some(envelope) = out_rx.recv().await {
            if ws_sender.send(Message::Text(envelope.into())).await.is_err() {
                break;
            }
        }
    });

    let transport = Arc::new(transport);
    transport.set_stream_id(call_id.clone()).await;

    let deps = OrchestratorDeps {
        stt: (state.stt_factory)(),
        llm: Arc::clone(&state.llm),
        tts: Arc::clone(&state.tts),
        tools: Arc::clone(&state.tools),
        config_repo: Arc::clone(&state.config_repo),
        call_repo: state.call_repo.clone(),
        crm: state.crm.clone(),
        telnyx: state.telnyx.clone(),
    };

    let orchestrator = match voice_orchestrator::Orchestrator::start(
        call_id.clone(),
        agent_id,
        CarrierKind::Browser,
        Arc::clone(&transport) as Arc<dyn AudioTransport>,
        None,
        deps,
    )
    .await
    {
        Ok(orch) => orch,
        Err(err) => {
            tracing::error!(%err, call_id = %call_id, "failed to start orchestrator for browser call");
            egress.abort();
            return;
        }
    };
    state.connections.register(call_id.clone(), Arc::clone(&orchestrator)).await;

    let mut ingest = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            let Message::Text(text) = msg else {
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                continue;
            };
            let Ok(event): Result<Value, _> = serde_json::from_str(&text) else { continue };
            let Some(kind) = event.get("type").and_then(|v| v.as_str()) else { continue };
            if kind != "audio" {
                continue;
            }
            let Some(payload) = event.get("data").and_then(|v| v.as_str()) else { continue };
            let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(payload) else { continue };
            let format =
                AudioFormat { sample_rate: 16_000, channels: 1, bits_per_sample: 16, encoding: AudioEncoding::Linear16 };
            orchestrator.handle_inbound_audio(AudioFrame::new(bytes, format)).await;
        }
        orchestrator.stop().await;
        state.connections.deregister(&call_id).await;
    });

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
    }
}
