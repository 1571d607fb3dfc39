//! Per-call session metadata.
//!
//! `CallContext` is grounded in `app/domain/value_objects/call_context.py`
//! (the record the Dialer hands off and the orchestrator rehydrates from a
//! carrier's `client_state`). `CallSession` is the new crate's equivalent of
//! the ad hoc instance fields `VoiceOrchestrator.__init__` sets directly on
//! `self` in `app/core/orchestrator.py`, pulled out into a named struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::config::CarrierKind;

/// Opaque context an outbound dial carries through to the answered call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallContext {
    pub to: String,
    pub from: String,
    pub connection_id: String,
    pub client_state: String,
    pub agent_id: String,
}

/// Runtime metadata for one live call. Owned exclusively by one Orchestrator.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_db_id: Option<String>,
    pub stream_id: Option<String>,
    pub carrier: CarrierKind,
    pub start_time: DateTime<Utc>,
    pub last_interaction_time: DateTime<Utc>,
    pub is_bot_speaking: bool,
    pub was_interrupted: bool,
    pub inactivity_retries: u32,
}

impl CallSession {
    pub fn new(carrier: CarrierKind) -> Self {
        let now = Utc::now();
        Self {
            call_db_id: None,
            stream_id: None,
            carrier,
            start_time: now,
            last_interaction_time: now,
            is_bot_speaking: false,
            was_interrupted: false,
            inactivity_retries: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_interaction_time = Utc::now();
        self.inactivity_retries = 0;
    }

    pub fn duration(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }

    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_interaction_time
    }
}
