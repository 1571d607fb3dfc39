//! The call-local voice pipeline: audio pacing and the VAD/STT/LLM/TTS
//! processor chain.

pub mod audio_manager;
pub mod error;
pub mod processors;
pub mod text_utils;

pub use audio_manager::AudioManager;
pub use error::PipelineError;
pub use processors::{LlmProcessor, SttProcessor, TtsProcessor, VadProcessor};
