//! Domain types, ports, and call-local runtime primitives for the voice orchestrator.
//!
//! This crate carries no network or provider code. Everything here is either a
//! pure value type, a trait (port) that an adapter crate implements, or a small
//! piece of call-local state machinery (`ConversationFsm`, `ControlChannel`,
//! `VadFilter`, the G.711 codec) that has no I/O of its own.

pub mod codec;
pub mod control_channel;
pub mod domain;
pub mod error;
pub mod fsm;
pub mod ports;
pub mod tool_registry;
pub mod vad_filter;

pub use codec::Codec;
pub use control_channel::{ControlChannel, ControlMessage, ControlSignal, ControlStats};
pub use domain::*;
pub use error::CoreError;
pub use fsm::{ConversationFsm, ConversationState};
pub use ports::{
    AudioTransport, CallRecord, CallRepositoryPort, ConfigRepositoryPort, CrmContext, CrmPort,
    LlmChunk, LlmFunctionCall, LlmPort, LlmStream, SttPort, ToolPort, TtsPort,
};
pub use tool_registry::ToolRegistry;
pub use vad_filter::{FilterVerdict, VadFilter};
