//! Outbound-dial stub (§4.13).
//!
//! Pops a queued `(to, agent_id)` pair, places the call via Telnyx's
//! `POST /v2/calls`, and hands the resulting `CallContext` to the
//! `ConnectionManager` keyed by the `client_state` the carrier will echo
//! back on the answered call's `start` event -- so the Orchestrator rehydrates
//! the context instead of treating the call as inbound. This is a thin stub:
//! the outbound-campaign scheduler (which call to dial next, retry policy,
//! CSV import) is out of scope; only the single-call dial-and-rehydrate
//! mechanism lives here.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Mutex;
use voice_core::domain::CallContext;
use voice_core::ConfigRepositoryPort;

use crate::connection_manager::ConnectionManager;

pub struct DialRequest {
    pub to: String,
    pub agent_id: String,
}

pub struct Dialer {
    queue: Mutex<VecDeque<DialRequest>>,
    config_repo: Arc<dyn ConfigRepositoryPort>,
    connections: Arc<ConnectionManager>,
    http: reqwest::Client,
    telnyx_api_key: String,
    telnyx_connection_id: String,
}

impl Dialer {
    pub fn new(
        config_repo: Arc<dyn ConfigRepositoryPort>,
        connections: Arc<ConnectionManager>,
        telnyx_api_key: String,
        telnyx_connection_id: String,
    ) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            config_repo,
            connections,
            http: reqwest::Client::new(),
            telnyx_api_key,
            telnyx_connection_id,
        }
    }

    pub async fn enqueue(&self, request: DialRequest) {
        self.queue.lock().await.push_back(request);
    }

    /// Drains the queue, pacing against `rate_limit_telnyx` re-read from
    /// `AgentConfig` on every iteration -- a mid-campaign config edit takes
    /// effect starting at the next dial, never retroactively, and in-flight
    /// calls are never cancelled. This is documented behavior, not a defect.
    pub async fn run_once(&self) {
        loop {
            let request = { self.queue.lock().await.pop_front() };
            let Some(request) = request else { return };

            let config = match self.config_repo.get_config(&request.agent_id).await {
                Ok(c) => c,
                Err(err) => {
                    tracing::error!(%err, agent_id = %request.agent_id, "dialer: failed to load agent config, dropping dial");
                    continue;
                }
            };

            let client_state = uuid::Uuid::new_v4().to_string();
            match self.place_call(&request, &client_state).await {
                Ok(connection_id) => {
                    let context = CallContext {
                        to: request.to.clone(),
                        from: self.telnyx_connection_id.clone(),
                        connection_id,
                        client_state: client_state.clone(),
                        agent_id: request.agent_id.clone(),
                    };
                    self.connections.register_pending_dial(client_state, context).await;
                }
                Err(err) => tracing::error!(%err, to = %request.to, "dialer: telnyx call placement failed"),
            }

            let pace_ms = if config.rate_limit_telnyx == 0 { 0 } else { 1000 / config.rate_limit_telnyx.max(1) as u64 };
            if pace_ms > 0 {
                tokio::time::sleep(Duration::from_millis(pace_ms)).await;
            }
        }
    }

    async fn place_call(&self, request: &DialRequest, client_state: &str) -> Result<String, reqwest::Error> {
        let body = json!({
            "connection_id": self.telnyx_connection_id,
            "to": request.to,
            "from": self.telnyx_connection_id,
            "client_state": client_state,
        });
        let response = self
            .http
            .post("https://api.telnyx.com/v2/calls")
            .bearer_auth(&self.telnyx_api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let payload: serde_json::Value = response.json().await?;
        Ok(payload["data"]["call_control_id"].as_str().unwrap_or_default().to_string())
    }
}
