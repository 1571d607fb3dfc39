//! In-process tool (function) port.
//!
//! Grounded in `app/domain/ports/tool_port.py::ToolPort`. Per that file's own
//! docstring contract, implementations are expected to catch their own
//! exceptions and return `ToolResponse { ok: false, .. }` rather than letting
//! errors propagate -- only truly unexpected failures should surface as `Err`.

use async_trait::async_trait;

use crate::domain::{ToolDefinition, ToolRequest, ToolResponse};
use crate::error::CoreError;

#[async_trait]
pub trait ToolPort: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, request: ToolRequest) -> Result<ToolResponse, CoreError>;
}
