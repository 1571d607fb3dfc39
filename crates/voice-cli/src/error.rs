//! CLI-specific error type and exit-code mapping.
//!
//! A `CliError`/`exit_code()` pattern narrowed to what this binary can
//! actually fail at: config, bind, and startup. Everything downstream of
//! startup is handled by the library crates' own error types and never
//! escapes to this boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}

impl CliError {
    /// Exit codes follow sysexits.h conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 78, // EX_CONFIG
            CliError::Server(_) => 71, // EX_OSERR
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Server(err.to_string())
    }
}
