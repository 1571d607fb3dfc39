pub mod llm;
pub mod stt;
pub mod tts;
pub mod vad;

pub use llm::LlmProcessor;
pub use stt::SttProcessor;
pub use tts::TtsProcessor;
pub use vad::VadProcessor;
