//! Audio frame and format value types.
//!
//! Grounded in `app/domain/value_objects/voice_config.py::AudioFormat` (the
//! `is_telephony`/`is_browser`/`for_client_type` factory) and the byte-payload
//! shape a WebSocket audio channel pushes frames through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    Linear16,
    Mulaw,
    Alaw,
}

/// Self-describing wire format for one leg of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub encoding: AudioEncoding,
}

impl AudioFormat {
    pub const fn is_telephony(&self) -> bool {
        matches!(self.encoding, AudioEncoding::Mulaw | AudioEncoding::Alaw)
    }

    pub const fn is_browser(&self) -> bool {
        matches!(self.encoding, AudioEncoding::Linear16)
    }

    /// Default wire format for a given carrier string (`"browser"`, `"twilio"`, `"telnyx"`).
    pub fn for_carrier(carrier: &str) -> Self {
        match carrier {
            "browser" => Self {
                sample_rate: 16_000,
                channels: 1,
                bits_per_sample: 16,
                encoding: AudioEncoding::Linear16,
            },
            _ => Self {
                sample_rate: 8_000,
                channels: 1,
                bits_per_sample: 8,
                encoding: AudioEncoding::Mulaw,
            },
        }
    }
}

/// A chunk of raw audio samples, already in the target wire encoding.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioFrame {
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
