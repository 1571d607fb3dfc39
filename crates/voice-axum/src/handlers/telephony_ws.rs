//! WebSocket upgrade handler for inbound telephony media streams.
//!
//! `GET /ws/media-stream?client=twilio|telnyx` -- the carrier connects here
//! immediately after `start`ing a call (per the TwiML `<Connect><Stream>`
//! response, or Telnyx's equivalent webhook action). Message shapes follow
//! §6: JSON text frames carrying `start`/`media`/`stop` events, each field
//! named exactly as the carrier sends it.
//!
//! Follows the usual ingest/egress task-pair pattern for a bidirectional
//! WebSocket adapter: one task drains the transport's outbound channel onto
//! the socket, one task reads the socket and feeds the Orchestrator, and
//! `tokio::select!` tears both down when either side closes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use voice_core::domain::{AudioEncoding, AudioFormat, AudioFrame, CarrierKind};
use voice_core::AudioTransport;
use voice_orchestrator::{Orchestrator, OrchestratorDeps};
use voice_transport::{Carrier, TelephonyTransport};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MediaStreamParams {
    pub client: String,
}

pub async fn media_stream_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<MediaStreamParams>,
) -> impl IntoResponse {
    let (carrier, carrier_kind) = match params.client.as_str() {
        "telnyx" => (Carrier::Telnyx, CarrierKind::Telnyx),
        _ => (Carrier::Twilio, CarrierKind::Twilio),
    };
    ws.on_upgrade(move |socket| handle_media_stream(socket, state, carrier, carrier_kind))
}

fn stream_id_of(carrier_kind: CarrierKind, event: &Value) -> Option<String> {
    let key = if carrier_kind == CarrierKind::Twilio { "streamSid" } else { "stream_id" };
    event
        .get(key)
        .or_else(|| event.get("start").and_then(|s| s.get(key)))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn client_state_of(event: &Value) -> Option<String> {
    event
        .get("start")
        .and_then(|s| s.get("customParameters"))
        .and_then(|p| p.get("client_state"))
        .or_else(|| event.get("client_state"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

async fn handle_media_stream(socket: WebSocket, state: AppState, carrier: Carrier, carrier_kind: CarrierKind) {
    let (transport, mut out_rx) = TelephonyTransport::new(carrier);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut egress = tokio::spawn(async move {
        while let Some(envelope) = out_rx.recv().await {
            if ws_sender.send(Message::Text(envelope.into())).await.is_err() {
                break;
            }
        }
    });

    let transport = Arc::new(transport);
    let mut orchestrator: Option<Arc<Orchestrator>> = None;
    let mut call_id = String::new();

    let mut ingest = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            let Message::Text(text) = msg else {
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                continue;
            };
            let Ok(event): Result<Value, _> = serde_json::from_str(&text) else { continue };
            let Some(kind) = event.get("event").and_then(|v| v.as_str()) else { continue };

            match kind {
                "start" => {
                    let Some(stream_id) = stream_id_of(carrier_kind, &event) else { continue };
                    transport.set_stream_id(stream_id.clone()).await;
                    call_id = stream_id.clone();

                    let pending = match client_state_of(&event) {
                        Some(cs) => state.connections.take_pending_dial(&cs).await,
                        None => None,
                    };
                    let (agent_id, caller_phone) = match &pending {
                        Some(ctx) => (ctx.agent_id.clone(), Some(ctx.to.clone())),
                        None => (state.default_agent_id.clone(), None),
                    };

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

                    match Orchestrator::start(
                        call_id.clone(),
                        agent_id,
                        carrier_kind,
                        Arc::clone(&transport) as Arc<dyn AudioTransport>,
                        caller_phone,
                        deps,
                    )
                    .await
                    {
                        Ok(orch) => {
                            if let Some(ctx) = &pending {
                                orch.set_call_control_id(ctx.connection_id.clone()).await;
                            }
                            state.connections.register(call_id.clone(), Arc::clone(&orch)).await;
                            orchestrator = Some(orch);
                        }
                        Err(err) => {
                            tracing::error!(%err, call_id = %call_id, "failed to start orchestrator for inbound call");
                            break;
                        }
                    }
                }
                "media" => {
                    let Some(orch) = &orchestrator else { continue };
                    let Some(payload) = event.get("media").and_then(|m| m.get("payload")).and_then(|v| v.as_str())
                    else {
                        continue;
                    };
                    let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(payload) else { continue };
                    let format = AudioFormat {
                        sample_rate: 8_000,
                        channels: 1,
                        bits_per_sample: 8,
                        encoding: AudioEncoding::Mulaw,
                    };
                    orch.handle_inbound_audio(AudioFrame::new(bytes, format)).await;
                }
                "stop" => {
                    break;
                }
                _ => {}
            }
        }

        if let Some(orch) = orchestrator {
            orch.stop().await;
            state.connections.deregister(&call_id).await;
        }
    });

    tokio::select! {
        _ = &mut ingest => { egress.abort(); }
        _ = &mut egress => { ingest.abort(); }
    }
}
