//! Typed agent configuration with per-carrier overlays.
//!
//! Grounded in `app/domain/ports/config_repository_port.py::ConfigDTO`, which
//! carries ~50 flat fields plus two opaque overlay blobs
//! (`extra_settings_phone`, `extra_settings_telnyx`). Per the redesign note in
//! the system specification, those opaque blobs are replaced here by a typed
//! `CarrierOverride` record merged into a call-local copy at call start
//! (`AgentConfig::for_carrier`), instead of being interpreted ad hoc deep in
//! the orchestrator.

use serde::{Deserialize, Serialize};

use crate::domain::voice_config::VoiceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierKind {
    Browser,
    Twilio,
    Telnyx,
}

/// Base, persisted agent behavior. One record per agent; never mutated after
/// a call starts -- `for_carrier` always produces a new, call-local value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    // LLM
    pub llm_provider: String,
    pub llm_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub first_message: Option<String>,
    pub context_window: usize,

    // TTS
    pub tts_provider: String,
    pub voice: VoiceConfig,
    pub voice_language: String,
    pub voice_pacing_ms: u64,

    // STT
    pub stt_provider: String,
    pub stt_language: String,
    pub silence_timeout_ms: u64,
    pub initial_silence_timeout_ms: u64,
    pub min_confidence_chars: usize,
    pub interruption_threshold_chars: usize,
    pub hallucination_blacklist: Vec<String>,

    // Call lifecycle
    pub idle_timeout_secs: u64,
    pub max_duration_secs: u64,
    pub inactivity_max_retries: u32,
    pub transfer_to: Option<String>,

    // Function calling
    pub tool_timeout_ms_default: u64,

    // Dialer
    pub rate_limit_telnyx: u32,

    // Overlays
    pub browser_override: Option<CarrierOverride>,
    pub phone_override: Option<CarrierOverride>,
    pub telnyx_override: Option<CarrierOverride>,
}

/// Sparse per-carrier replacement for a subset of `AgentConfig` fields.
/// All fields are optional; only the ones present replace the base value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarrierOverride {
    pub system_prompt: Option<String>,
    pub first_message: Option<String>,
    pub voice: Option<VoiceConfig>,
    pub voice_language: Option<String>,
    pub stt_language: Option<String>,
    pub silence_timeout_ms: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub max_duration_secs: Option<u64>,
}

impl AgentConfig {
    /// Applies the overlay (if any) for `carrier`, returning a call-local copy.
    /// The persisted base record is untouched.
    pub fn for_carrier(&self, carrier: CarrierKind) -> Self {
        let overlay = match carrier {
            CarrierKind::Browser => self.browser_override.clone(),
            CarrierKind::Twilio => self.phone_override.clone(),
            CarrierKind::Telnyx => self.telnyx_override.clone(),
        };
        let Some(overlay) = overlay else {
            return self.clone();
        };
        let mut merged = self.clone();
        if let Some(v) = overlay.system_prompt {
            merged.system_prompt = v;
        }
        if let Some(v) = overlay.first_message {
            merged.first_message = Some(v);
        }
        if let Some(v) = overlay.voice {
            merged.voice = v;
        }
        if let Some(v) = overlay.voice_language {
            merged.voice_language = v;
        }
        if let Some(v) = overlay.stt_language {
            merged.stt_language = v;
        }
        if let Some(v) = overlay.silence_timeout_ms {
            merged.silence_timeout_ms = v;
        }
        if let Some(v) = overlay.idle_timeout_secs {
            merged.idle_timeout_secs = v;
        }
        if let Some(v) = overlay.max_duration_secs {
            merged.max_duration_secs = v;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AgentConfig {
        AgentConfig {
            llm_provider: "groq".into(),
            llm_model: "llama-3.3-70b-versatile".into(),
            temperature: 0.7,
            max_tokens: 600,
            system_prompt: "base prompt".into(),
            first_message: None,
            context_window: 20,
            tts_provider: "azure".into(),
            voice: VoiceConfig::default_for("es-MX-DaliaNeural"),
            voice_language: "es-MX".into(),
            voice_pacing_ms: 0,
            stt_provider: "azure".into(),
            stt_language: "es-MX".into(),
            silence_timeout_ms: 2000,
            initial_silence_timeout_ms: 30_000,
            min_confidence_chars: 4,
            interruption_threshold_chars: 5,
            hallucination_blacklist: vec!["Mm.".into()],
            idle_timeout_secs: 10,
            max_duration_secs: 600,
            inactivity_max_retries: 2,
            transfer_to: None,
            tool_timeout_ms_default: 10_000,
            rate_limit_telnyx: 5,
            browser_override: None,
            phone_override: Some(CarrierOverride {
                silence_timeout_ms: Some(2500),
                ..Default::default()
            }),
            telnyx_override: None,
        }
    }

    #[test]
    fn overlay_replaces_only_present_fields() {
        let merged = base().for_carrier(CarrierKind::Twilio);
        assert_eq!(merged.silence_timeout_ms, 2500);
        assert_eq!(merged.system_prompt, "base prompt");
    }

    #[test]
    fn missing_overlay_is_a_plain_copy() {
        let merged = base().for_carrier(CarrierKind::Browser);
        assert_eq!(merged.silence_timeout_ms, 2000);
    }

    #[test]
    fn base_record_is_never_mutated() {
        let cfg = base();
        let _ = cfg.for_carrier(CarrierKind::Twilio);
        assert_eq!(cfg.silence_timeout_ms, 2000);
    }
}
