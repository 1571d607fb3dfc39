//! Browser WebSocket transport.
//!
//! The browser client speaks a simpler envelope than the telephony
//! carriers: raw base64 audio frames and a `clear` control event used to
//! flush client-side playback on barge-in (grounded in
//! `app/api/websocket_browser.py`'s message shapes).

use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use voice_core::error::CoreError;
use voice_core::AudioTransport;

pub struct BrowserTransport {
    connection_id: Mutex<Option<String>>,
    out_tx: mpsc::Sender<String>,
}

impl BrowserTransport {
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(256);
        (Self { connection_id: Mutex::new(None), out_tx: tx }, rx)
    }
}

impl Default for BrowserTransport {
    fn default() -> Self {
        Self::new().0
    }
}

#[async_trait]
impl AudioTransport for BrowserTransport {
    async fn send_audio(&self, audio: &[u8]) -> Result<(), CoreError> {
        let payload = base64::engine::general_purpose::STANDARD.encode(audio);
        let envelope = json!({ "type": "audio", "data": payload });
        self.out_tx
            .send(envelope.to_string())
            .await
            .map_err(|_| CoreError::Internal("browser transport closed".into()))
    }

    async fn send_json(&self, value: Value) -> Result<(), CoreError> {
        self.out_tx
            .send(value.to_string())
            .await
            .map_err(|_| CoreError::Internal("browser transport closed".into()))
    }

    async fn set_stream_id(&self, stream_id: String) {
        *self.connection_id.lock().unwrap() = Some(stream_id);
    }

    async fn close(&self) -> Result<(), CoreError> {
        self.out_tx
            .send(json!({ "event": "close" }).to_string())
            .await
            .map_err(|_| CoreError::Internal("browser transport closed".into()))
    }
}

impl BrowserTransport {
    /// Tells the browser client to discard any audio it has already
    /// buffered for playback -- the client-side half of a barge-in.
    pub async fn send_clear(&self) -> Result<(), CoreError> {
        self.out_tx
            .send(json!({ "event": "clear" }).to_string())
            .await
            .map_err(|_| CoreError::Internal("browser transport closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn audio_envelope_uses_type_audio_shape() {
        let (transport, mut rx) = BrowserTransport::new();
        transport.send_audio(&[1, 2, 3]).await.unwrap();
        let sent = rx.recv().await.unwrap();
        let parsed: Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(parsed["type"], "audio");
        assert!(parsed["data"].is_string());
    }

    #[tokio::test]
    async fn send_clear_emits_clear_event() {
        let (transport, mut rx) = BrowserTransport::new();
        transport.send_clear().await.unwrap();
        let sent = rx.recv().await.unwrap();
        let parsed: Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(parsed["event"], "clear");
    }
}
