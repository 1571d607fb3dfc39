//! Error taxonomy for the domain and port layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid voice config: {0}")]
    InvalidVoiceConfig(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool {tool} timed out after {timeout_ms}ms")]
    ToolTimeout { tool: String, timeout_ms: u64 },

    #[error("tool {tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("repository error: {0}")]
    RepositoryError(String),

    #[error("internal error: {0}")]
    Internal(String),
}
