//! Shared application state type and the composition-root context it wraps.

use std::sync::Arc;

use voice_core::{CallRepositoryPort, ConfigRepositoryPort, CrmPort, LlmPort, SttPort, ToolRegistry, TtsPort};
use voice_orchestrator::{ConnectionManager, Dialer, TelnyxClient};

/// Builds a fresh `SttPort` session for one call. Unlike `LlmPort`/`TtsPort`
/// (stateless, safely shared), an `SttPort` implementation owns a live
/// provider session (`start`/`push_audio`/`next_event`/`stop`) and cannot be
/// multiplexed across concurrent calls -- so the registry holds a factory
/// instead of an instance, and each WebSocket upgrade builds its own.
pub type SttFactory = Arc<dyn Fn() -> Arc<dyn SttPort> + Send + Sync>;

/// Application state shared across all handlers: an `Arc<AxumContext>`
/// shared-registry pattern.
pub type AppState = Arc<AxumContext>;

pub struct AxumContext {
    pub connections: Arc<ConnectionManager>,
    pub dialer: Arc<Dialer>,
    pub config_repo: Arc<dyn ConfigRepositoryPort>,
    pub call_repo: Option<Arc<dyn CallRepositoryPort>>,
    pub crm: Option<Arc<dyn CrmPort>>,
    pub llm: Arc<dyn LlmPort>,
    pub tts: Arc<dyn TtsPort>,
    pub tools: Arc<ToolRegistry>,
    pub stt_factory: SttFactory,
    pub telnyx: Option<Arc<TelnyxClient>>,
    pub default_agent_id: String,
    pub public_host: String,
    /// Gates `POST /admin/dial`. Checked against a bearer token, not hashed
    /// or compared in constant time -- this is an internal operator endpoint,
    /// not a public-facing credential boundary.
    pub admin_api_key: String,
}
