//! In-memory stand-in for the config/call/CRM repository ports.
//!
//! Persistence proper is out of scope (§1: "abstracted behind repository
//! ports"); this gives the composition root something real to hand the
//! Orchestrator so calls actually start, logging transcripts instead of
//! writing them anywhere durable.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use voice_core::domain::AgentConfig;
use voice_core::error::CoreError;
use voice_core::{CallRecord, CallRepositoryPort, ConfigRepositoryPort, CrmContext, CrmPort};

pub struct SingleAgentConfigRepo {
    agent_id: String,
    config: AgentConfig,
}

impl SingleAgentConfigRepo {
    pub fn new(agent_id: String, config: AgentConfig) -> Self {
        Self { agent_id, config }
    }
}

#[async_trait]
impl ConfigRepositoryPort for SingleAgentConfigRepo {
    async fn get_config(&self, agent_id: &str) -> Result<AgentConfig, CoreError> {
        if agent_id != self.agent_id {
            tracing::warn!(agent_id, default_agent_id = %self.agent_id, "unknown agent_id, serving default config");
        }
        Ok(self.config.clone())
    }
}

pub struct InMemoryCallRepo {
    calls: Mutex<Vec<CallRecord>>,
}

impl InMemoryCallRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl CallRepositoryPort for InMemoryCallRepo {
    async fn create_call(&self, session_id: &str, carrier: &str) -> Result<CallRecord, CoreError> {
        let record = CallRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            carrier: carrier.to_string(),
            start_time: chrono::Utc::now(),
            end_time: None,
            status: "in_progress".to_string(),
        };
        self.calls.lock().await.push(record.clone());
        Ok(record)
    }

    async fn end_call(&self, call_id: &str, status: &str) -> Result<(), CoreError> {
        let mut calls = self.calls.lock().await;
        if let Some(record) = calls.iter_mut().find(|c| c.id == call_id) {
            record.status = status.to_string();
            record.end_time = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn append_transcript(&self, call_id: &str, role: &str, content: &str) -> Result<(), CoreError> {
        tracing::debug!(call_id, role, content, "transcript line (no durable store configured)");
        Ok(())
    }
}

/// Always reports no known caller; real CRM integration is out of scope.
pub struct NullCrmPort;

#[async_trait]
impl CrmPort for NullCrmPort {
    async fn lookup(&self, _phone_number: &str) -> Result<CrmContext, CoreError> {
        Ok(CrmContext::default())
    }

    async fn record_outcome(&self, _phone_number: &str, _summary: &str) -> Result<(), CoreError> {
        Ok(())
    }
}
