pub mod audio;
pub mod call_session;
pub mod config;
pub mod message;
pub mod tool;
pub mod voice_config;

pub use audio::{AudioEncoding, AudioFormat, AudioFrame};
pub use call_session::{CallContext, CallSession};
pub use config::{AgentConfig, CarrierKind, CarrierOverride};
pub use message::{Message, Role, TextFrame, TranscriptEvent};
pub use tool::{ToolDefinition, ToolRequest, ToolResponse};
pub use voice_config::VoiceConfig;
