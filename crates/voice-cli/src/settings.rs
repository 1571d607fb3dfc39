//! Process-start environment settings (§1.1, §6).
//!
//! A flat struct with `Default`-backed fallbacks, overridden by env vars once
//! at startup and never re-read mid-process (the dialer's per-iteration
//! config read is a property of `AgentConfig`, not of this struct). Mirrors
//! `app/core/config.py`'s shape.

use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub public_host: String,
    pub default_agent_id: String,
    pub admin_api_key: String,

    pub azure_speech_key: Option<String>,
    pub azure_speech_region: Option<String>,
    pub groq_api_key: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub telnyx_api_key: Option<String>,
    pub telnyx_public_key: Option<String>,
    pub telnyx_connection_id: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080),
            public_host: env::var("PUBLIC_HOST").unwrap_or_else(|_| "localhost:8080".to_string()),
            default_agent_id: env::var("DEFAULT_AGENT_ID").unwrap_or_else(|_| "default".to_string()),
            admin_api_key: env::var("ADMIN_API_KEY").unwrap_or_else(|_| "changeme".to_string()),

            azure_speech_key: env::var("AZURE_SPEECH_KEY").ok(),
            azure_speech_region: env::var("AZURE_SPEECH_REGION").ok(),
            groq_api_key: env::var("GROQ_API_KEY").ok(),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").ok(),
            telnyx_api_key: env::var("TELNYX_API_KEY").ok(),
            telnyx_public_key: env::var("TELNYX_PUBLIC_KEY").ok(),
            telnyx_connection_id: env::var("TELNYX_CONNECTION_ID").ok(),
        }
    }
}
