//! Placeholder STT/LLM/TTS adapters and the string-keyed registry that
//! selects between them (§9: "Implementations are registered at startup via
//! a small registry keyed by string; the Orchestrator sees only ports.").
//!
//! Real provider adapters (Azure Speech, Groq, …) are out of scope (§1, §6);
//! these `Null*` types satisfy the port contracts without talking to any
//! external service, so the server boots and runs its lifecycle end to end
//! even with no credentials configured. A real deployment swaps these for
//! credentialed adapters behind the same ports; nothing above this module
//! would change.

use std::sync::Arc;

use async_trait::async_trait;

use voice_core::domain::{AgentConfig, AudioFormat, Message, ToolDefinition, VoiceConfig};
use voice_core::error::CoreError;
use voice_core::{AudioFrame, LlmChunk, LlmPort, LlmStream, SttPort, TranscriptEvent, TtsPort};

pub struct NullSttPort;

#[async_trait]
impl SttPort for NullSttPort {
    async fn start(&self, language: &str) -> Result<(), CoreError> {
        tracing::warn!(language, "no STT provider configured; call will receive no transcripts");
        Ok(())
    }

    async fn push_audio(&self, _frame: AudioFrame) -> Result<(), CoreError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<TranscriptEvent> {
        None
    }

    async fn stop(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

struct NullLlmStream {
    done: bool,
}

#[async_trait]
impl LlmStream for NullLlmStream {
    async fn next_chunk(&mut self) -> Option<LlmChunk> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(LlmChunk {
            text: Some("This agent has no language model provider configured.".to_string()),
            function_call: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn cancel(&mut self) {
        self.done = true;
    }
}

pub struct NullLlmPort;

#[async_trait]
impl LlmPort for NullLlmPort {
    async fn generate(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<Box<dyn LlmStream>, CoreError> {
        Ok(Box::new(NullLlmStream { done: false }))
    }
}

pub struct NullTtsPort;

#[async_trait]
impl TtsPort for NullTtsPort {
    async fn synthesize(
        &self,
        _ssml: &str,
        _voice: &VoiceConfig,
        target_format: AudioFormat,
    ) -> Result<Vec<u8>, CoreError> {
        // 200ms of silence in the target format, so AudioManager has
        // something real to pace and the carrier's jitter buffer stays fed.
        let bytes_per_sample = (target_format.bits_per_sample / 8).max(1) as usize;
        let sample_count = target_format.sample_rate as usize / 5;
        Ok(vec![0u8; sample_count * bytes_per_sample * target_format.channels as usize])
    }
}

/// Picks an `LlmPort` by provider name. Only `"none"` is implemented; any
/// other value falls back to it with a loud warning rather than failing
/// startup, since wiring a real provider is explicitly out of scope here.
pub fn build_llm(provider: &str) -> Arc<dyn LlmPort> {
    match provider {
        "none" => Arc::new(NullLlmPort),
        other => {
            tracing::warn!(provider = other, "unknown/unimplemented LLM provider, falling back to none");
            Arc::new(NullLlmPort)
        }
    }
}

pub fn build_tts(provider: &str) -> Arc<dyn TtsPort> {
    match provider {
        "none" => Arc::new(NullTtsPort),
        other => {
            tracing::warn!(provider = other, "unknown/unimplemented TTS provider, falling back to none");
            Arc::new(NullTtsPort)
        }
    }
}

/// Returns a factory closure building a fresh `SttPort` per call (§4:
/// `SttPort` is stateful, so one instance is needed per call, not shared).
pub fn stt_factory(provider: &str) -> voice_axum::SttFactory {
    let provider = provider.to_string();
    Arc::new(move || -> Arc<dyn SttPort> {
        match provider.as_str() {
            "none" => Arc::new(NullSttPort),
            other => {
                tracing::warn!(provider = other, "unknown/unimplemented STT provider, falling back to none");
                Arc::new(NullSttPort)
            }
        }
    })
}

/// Single hardcoded agent so the server is immediately callable without a
/// real config-repository adapter (persistence is out of scope, §1).
pub fn default_agent_config() -> AgentConfig {
    AgentConfig {
        llm_provider: "none".to_string(),
        llm_model: "none".to_string(),
        temperature: 0.7,
        max_tokens: 600,
        system_prompt: "You are a helpful voice assistant.".to_string(),
        first_message: Some("Hello, how can I help you today?".to_string()),
        context_window: 20,
        tts_provider: "none".to_string(),
        voice: VoiceConfig::default_for("default"),
        voice_language: "en-US".to_string(),
        voice_pacing_ms: 0,
        stt_provider: "none".to_string(),
        stt_language: "en-US".to_string(),
        silence_timeout_ms: 2000,
        initial_silence_timeout_ms: 30_000,
        min_confidence_chars: 4,
        interruption_threshold_chars: 5,
        hallucination_blacklist: vec!["Mm.".to_string()],
        idle_timeout_secs: 10,
        max_duration_secs: 600,
        inactivity_max_retries: 2,
        transfer_to: None,
        tool_timeout_ms_default: 10_000,
        rate_limit_telnyx: 5,
        browser_override: None,
        phone_override: None,
        telnyx_override: None,
    }
}
