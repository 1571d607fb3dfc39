//! Text-to-speech provider port.

use async_trait::async_trait;

use crate::domain::{AudioFormat, VoiceConfig};
use crate::error::CoreError;

#[async_trait]
pub trait TtsPort: Send + Sync {
    /// Synthesizes `ssml` and returns audio already encoded in `target_format`.
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceConfig,
        target_format: AudioFormat,
    ) -> Result<Vec<u8>, CoreError>;
}
