//! LLM generation port.
//!
//! `LlmChunk`/`LlmFunctionCall` are ported near-verbatim from
//! `app/domain/models/llm_models.py` (`LLMChunk`/`LLMFunctionCall`), including
//! the `has_text`/`has_function_call`/`is_complete` derived predicates. The
//! "async generator" stream the original returns becomes, per the redesign
//! note in the system specification, a handle type the caller polls for the
//! next chunk and can cancel -- `LlmStream` below.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Message, ToolDefinition};
use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct LlmFunctionCall {
    pub name: String,
    pub arguments: Value,
    pub call_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmChunk {
    pub text: Option<String>,
    pub function_call: Option<LlmFunctionCall>,
    pub finish_reason: Option<String>,
}

impl LlmChunk {
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn has_function_call(&self) -> bool {
        self.function_call.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// A cancellable handle over an in-flight generation. Implementors wrap
/// whatever streaming transport (SSE, gRPC stream, …) the provider uses.
#[async_trait]
pub trait LlmStream: Send {
    /// Returns the next chunk, or `None` once the stream is exhausted.
    async fn next_chunk(&mut self) -> Option<LlmChunk>;

    /// Idempotent: cancelling an already-finished stream is a no-op.
    async fn cancel(&mut self);
}

#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Box<dyn LlmStream>, CoreError>;
}
