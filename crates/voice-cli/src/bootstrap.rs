//! Composition root: turns `Settings` into the `AxumDeps` the web adapter
//! needs, using the in-scope placeholder ports (§9: providers registered via
//! a string-keyed registry; persistence out of scope).

use std::sync::Arc;

use voice_axum::AxumDeps;
use voice_core::ToolRegistry;

use crate::memory_config_repo::{InMemoryCallRepo, NullCrmPort, SingleAgentConfigRepo};
use crate::providers::{build_llm, build_tts, default_agent_config, stt_factory};
use crate::settings::Settings;

pub fn build_deps(settings: &Settings) -> AxumDeps {
    let config = default_agent_config();

    AxumDeps {
        config_repo: Arc::new(SingleAgentConfigRepo::new(settings.default_agent_id.clone(), config.clone())),
        call_repo: Some(InMemoryCallRepo::new()),
        crm: Some(Arc::new(NullCrmPort)),
        llm: build_llm(&config.llm_provider),
        tts: build_tts(&config.tts_provider),
        tools: Arc::new(ToolRegistry::new()),
        stt_factory: stt_factory(&config.stt_provider),
        telnyx_api_key: settings.telnyx_api_key.clone(),
        telnyx_connection_id: settings.telnyx_connection_id.clone(),
        default_agent_id: settings.default_agent_id.clone(),
        admin_api_key: settings.admin_api_key.clone(),
    }
}
