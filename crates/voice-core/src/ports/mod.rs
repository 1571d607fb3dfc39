pub mod llm;
pub mod repository;
pub mod stt;
pub mod tool;
pub mod transport;
pub mod tts;

pub use llm::{LlmChunk, LlmFunctionCall, LlmPort, LlmStream};
pub use repository::{CallRecord, CallRepositoryPort, ConfigRepositoryPort, CrmContext, CrmPort};
pub use stt::SttPort;
pub use tool::ToolPort;
pub use transport::AudioTransport;
pub use tts::TtsPort;
