//! Axum server bootstrap.
//!
//! This module is not itself the composition root for provider adapters --
//! concrete STT/LLM/TTS/CRM implementations are out of scope for this crate
//! (§6/§9) and are constructed by the binary crate, then handed in as
//! `AxumDeps`. This module only wires those already-built ports into the
//! per-call registry (`ConnectionManager`, `Dialer`) and the router.

use std::sync::Arc;

use voice_core::{CallRepositoryPort, ConfigRepositoryPort, CrmPort, LlmPort, SttPort, ToolRegistry, TtsPort};
use voice_orchestrator::{ConnectionManager, Dialer, TelnyxClient};

use crate::state::{AppState, AxumContext, SttFactory};

/// CORS configuration for the server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    #[default]
    AllowAll,
    AllowOrigins(Vec<String>),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub public_host: String,
    pub cors: CorsConfig,
}

/// Externally-constructed ports this adapter wires into per-call registries.
/// Built by the binary crate's own composition root (§6: provider adapters
/// proper are out of scope for this repository beyond the Telnyx REST calls).
pub struct AxumDeps {
    pub config_repo: Arc<dyn ConfigRepositoryPort>,
    pub call_repo: Option<Arc<dyn CallRepositoryPort>>,
    pub crm: Option<Arc<dyn CrmPort>>,
    pub llm: Arc<dyn LlmPort>,
    pub tts: Arc<dyn TtsPort>,
    pub tools: Arc<ToolRegistry>,
    pub stt_factory: SttFactory,
    pub telnyx_api_key: Option<String>,
    pub telnyx_connection_id: Option<String>,
    pub default_agent_id: String,
    pub admin_api_key: String,
}

pub fn bootstrap(deps: AxumDeps, config: &ServerConfig) -> AppState {
    let telnyx = deps
        .telnyx_api_key
        .clone()
        .map(|key| Arc::new(TelnyxClient::new(key)));

    let connections = Arc::new(ConnectionManager::new());
    let dialer = Arc::new(Dialer::new(
        Arc::clone(&deps.config_repo),
        Arc::clone(&connections),
        deps.telnyx_api_key.clone().unwrap_or_default(),
        deps.telnyx_connection_id.clone().unwrap_or_default(),
    ));

    let state = Arc::new(AxumContext {
        connections,
        dialer,
        config_repo: deps.config_repo,
        call_repo: deps.call_repo,
        crm: deps.crm,
        llm: deps.llm,
        tts: deps.tts,
        tools: deps.tools,
        stt_factory: deps.stt_factory,
        telnyx,
        default_agent_id: deps.default_agent_id,
        public_host: config.public_host.clone(),
        admin_api_key: deps.admin_api_key,
    });

    spawn_dialer_loop(Arc::clone(&state));
    state
}

/// Drains the dialer's queue once a second. The outbound-campaign scheduler
/// that decides what to enqueue is out of scope (§4.13) -- this loop only
/// keeps a non-empty queue moving at its configured pace.
fn spawn_dialer_loop(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            ticker.tick().await;
            state.dialer.run_once().await;
        }
    });
}

/// Starts the HTTP/WebSocket server. Blocks until the listener is closed.
pub async fn start_server(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    let app = crate::routes::create_router(state, &config.cors);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "voice-axum server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
