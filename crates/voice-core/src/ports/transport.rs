//! Carrier-facing audio transport port.
//!
//! Grounded in `app/domain/ports/audio_transport.py::AudioTransport` -- a
//! near-verbatim match: `send_audio`/`send_json`/`set_stream_id`/`close`.
//! Implementations (telephony, browser) live in the adapter crate; this
//! trait is a core port so `AudioManager` can depend on it without depending
//! on any WebSocket/HTTP machinery.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;

#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Sends already-encoded audio in the carrier's wire format.
    async fn send_audio(&self, audio: &[u8]) -> Result<(), CoreError>;

    /// Sends a carrier-specific JSON control/event message.
    async fn send_json(&self, value: Value) -> Result<(), CoreError>;

    /// Binds the carrier-assigned stream identifier once known.
    async fn set_stream_id(&self, stream_id: String);

    async fn close(&self) -> Result<(), CoreError>;
}
