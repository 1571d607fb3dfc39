//! Pipeline-level error taxonomy.

use thiserror::Error;
use voice_core::CoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("processor closed: {0}")]
    ProcessorClosed(&'static str),

    #[error("stt error: {0}")]
    Stt(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("tts error: {0}")]
    Tts(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
