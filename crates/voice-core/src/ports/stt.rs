//! Speech-to-text provider port.
//!
//! Grounded in the shape of `app/domain/ports/audio_transport.py`'s ABC
//! (small, imperative, push-based interface) generalized to STT: the adapter
//! pushes audio in and the orchestrator polls `next_event` for partial/final
//! recognitions, mirroring how the original's Azure-specific recognizer
//! callback pushes events onto an internal queue.

use async_trait::async_trait;

use crate::domain::{AudioFrame, TranscriptEvent};
use crate::error::CoreError;

#[async_trait]
pub trait SttPort: Send + Sync {
    async fn start(&self, language: &str) -> Result<(), CoreError>;

    async fn push_audio(&self, frame: AudioFrame) -> Result<(), CoreError>;

    /// Returns the next recognition event, or `None` once the stream has
    /// ended (provider closed, or `stop` was called).
    async fn next_event(&self) -> Option<TranscriptEvent>;

    async fn stop(&self) -> Result<(), CoreError>;
}
