//! Carrier-facing audio transport adapters.
//!
//! Implements the `voice_core::AudioTransport` port for each carrier this
//! system speaks to: telephony (Twilio/Telnyx media streams) and the
//! browser WebSocket client. Neither implementation touches a socket
//! directly -- each wraps an outbound `mpsc::Sender<String>` that the HTTP
//! layer's WS egress task drains, keeping the adapters unit-testable
//! without a live connection.

pub mod browser;
pub mod error;
pub mod telephony;

pub use browser::BrowserTransport;
pub use error::TransportError;
pub use telephony::{Carrier, TelephonyTransport};
