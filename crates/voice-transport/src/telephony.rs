//! Telephony (Twilio/Telnyx) media-stream transport.
//!
//! Grounded in `app/domain/ports/audio_transport.py::AudioTransport`'s
//! contract and a channel-backed sink shape: this struct never touches the
//! WebSocket directly -- it serializes envelopes and pushes them onto an
//! `mpsc::Sender<String>`
//! that the axum WS egress task drains and forwards as text frames. That
//! keeps the transport testable without a live socket.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use voice_core::error::CoreError;
use voice_core::AudioTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Twilio,
    Telnyx,
}

pub struct TelephonyTransport {
    carrier: Carrier,
    stream_id: Mutex<Option<String>>,
    out_tx: mpsc::Sender<String>,
}

impl TelephonyTransport {
    pub fn new(carrier: Carrier) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(256);
        (Self { carrier, stream_id: Mutex::new(None), out_tx: tx }, rx)
    }

    fn stream_key(&self) -> &'static str {
        match self.carrier {
            Carrier::Twilio => "streamSid",
            Carrier::Telnyx => "stream_id",
        }
    }

    fn media_envelope(&self, payload_b64: &str) -> Value {
        let stream_id = self.stream_id.lock().unwrap().clone();
        let mut media = json!({ "payload": payload_b64 });
        if self.carrier == Carrier::Telnyx {
            media["track"] = json!("inbound_track");
        }
        json!({
            "event": "media",
            self.stream_key(): stream_id,
            "media": media,
        })
    }
}

#[async_trait]
impl AudioTransport for TelephonyTransport {
    async fn send_audio(&self, audio: &[u8]) -> Result<(), CoreError> {
        let payload = base64::engine::general_purpose::STANDARD.encode(audio);
        let envelope = self.media_envelope(&payload);
        self.out_tx
            .send(envelope.to_string())
            .await
            .map_err(|_| CoreError::Internal("telephony transport closed".into()))
    }

    async fn send_json(&self, value: Value) -> Result<(), CoreError> {
        self.out_tx
            .send(value.to_string())
            .await
            .map_err(|_| CoreError::Internal("telephony transport closed".into()))
    }

    async fn set_stream_id(&self, stream_id: String) {
        *self.stream_id.lock().unwrap() = Some(stream_id);
    }

    async fn close(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Splits a linear audio buffer into fixed-size telephony frames (160 bytes
/// = 20ms @ 8kHz G.711), per `app/core/managers/audio_manager.py`'s
/// `_transmit_audio` chunking.
pub fn chunk_for_telephony(bytes: &[u8], frame_bytes: usize) -> impl Iterator<Item = &[u8]> {
    bytes.chunks(frame_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn media_envelope_carries_stream_id_and_payload() {
        let (transport, mut rx) = TelephonyTransport::new(Carrier::Twilio);
        transport.set_stream_id("MZ123".into()).await;
        transport.send_audio(&[1, 2, 3]).await.unwrap();
        let sent = rx.recv().await.unwrap();
        let parsed: Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(parsed["streamSid"], "MZ123");
        assert_eq!(parsed["event"], "media");
    }

    #[tokio::test]
    async fn telnyx_outbound_media_is_tagged_inbound_track() {
        let (transport, mut rx) = TelephonyTransport::new(Carrier::Telnyx);
        transport.send_audio(&[9]).await.unwrap();
        let sent = rx.recv().await.unwrap();
        let parsed: Value = serde_json::from_str(&sent).unwrap();
        assert_eq!(parsed["media"]["track"], "inbound_track");
    }

    #[test]
    fn chunking_splits_into_fixed_size_frames() {
        let bytes = vec![0u8; 400];
        let chunks: Vec<_> = chunk_for_telephony(&bytes, 160).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 160);
        assert_eq!(chunks[2].len(), 80);
    }
}
