//! Persistence ports. No concrete storage adapter ships in this crate -- only
//! the trait surface the orchestrator depends on.
//!
//! `ConfigRepositoryPort` is grounded in
//! `app/domain/ports/config_repository_port.py::ConfigRepositoryPort`.
//! `CallRepositoryPort`/`CrmPort` generalize the call-record and best-effort
//! CRM lookups referenced in `app/core/orchestrator.py`'s lifecycle steps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::AgentConfig;
use crate::error::CoreError;

#[async_trait]
pub trait ConfigRepositoryPort: Send + Sync {
    async fn get_config(&self, agent_id: &str) -> Result<AgentConfig, CoreError>;
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: String,
    pub session_id: String,
    pub carrier: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: String,
}

#[async_trait]
pub trait CallRepositoryPort: Send + Sync {
    async fn create_call(&self, session_id: &str, carrier: &str) -> Result<CallRecord, CoreError>;
    async fn end_call(&self, call_id: &str, status: &str) -> Result<(), CoreError>;
    async fn append_transcript(&self, call_id: &str, role: &str, content: &str) -> Result<(), CoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct CrmContext {
    pub known_name: Option<String>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait CrmPort: Send + Sync {
    /// Best-effort lookup; failures are non-fatal at the call site (§4.11 step 2).
    async fn lookup(&self, phone_number: &str) -> Result<CrmContext, CoreError>;
    async fn record_outcome(&self, phone_number: &str, summary: &str) -> Result<(), CoreError>;
}
