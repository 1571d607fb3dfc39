//! Process-wide call registry (§4.12).
//!
//! Grounded in the `Arc<AxumContext>`-holding-shared-maps shared-registry
//! pattern used elsewhere in this codebase, generalized here from one
//! process-wide voice pipeline to per-call multiplicity, and in the original
//! source's `app/api/connection_manager.py`. Registering a connection id
//! that's already live evicts (stops) the previous Orchestrator first -- the
//! "zombie eviction" behavior: a reconnect under the same id should never
//! leave two Orchestrators driving the same call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use voice_core::domain::CallContext;

use crate::orchestrator::Orchestrator;

#[derive(Default)]
pub struct ConnectionManager {
    live: Mutex<HashMap<String, Arc<Orchestrator>>>,
    pending_dials: Mutex<HashMap<String, CallContext>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, client_id: String, handle: Arc<Orchestrator>) {
        let previous = { self.live.lock().await.insert(client_id.clone(), handle) };
        if let Some(zombie) = previous {
            tracing::warn!(client_id, "evicting stale orchestrator for reused connection id");
            zombie.stop().await;
        }
    }

    pub async fn deregister(&self, client_id: &str) {
        self.live.lock().await.remove(client_id);
    }

    pub async fn get(&self, client_id: &str) -> Option<Arc<Orchestrator>> {
        self.live.lock().await.get(client_id).cloned()
    }

    pub async fn evict_all(&self) {
        let all: Vec<_> = { self.live.lock().await.drain().map(|(_, v)| v).collect() };
        for orchestrator in all {
            orchestrator.stop().await;
        }
    }

    /// Stashes the `CallContext` an outbound dial produced, keyed by the
    /// `client_state` the carrier echoes back on the answered call's `start`
    /// event.
    pub async fn register_pending_dial(&self, client_state: String, context: CallContext) {
        self.pending_dials.lock().await.insert(client_state, context);
    }

    /// Consumes the pending dial context for `client_state`, if any. Called
    /// when a carrier `start` event arrives, to decide whether the call is
    /// an outbound rehydration or a fresh inbound call.
    pub async fn take_pending_dial(&self, client_state: &str) -> Option<CallContext> {
        self.pending_dials.lock().await.remove(client_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CallContext {
        CallContext {
            to: "+15550001".into(),
            from: "+15559999".into(),
            connection_id: "conn-1".into(),
            client_state: "state-1".into(),
            agent_id: "agent-1".into(),
        }
    }

    #[tokio::test]
    async fn pending_dial_round_trips_and_is_consumed_once() {
        let manager = ConnectionManager::new();
        manager.register_pending_dial("state-1".into(), context()).await;
        let found = manager.take_pending_dial("state-1").await;
        assert!(found.is_some());
        assert!(manager.take_pending_dial("state-1").await.is_none());
    }

    #[tokio::test]
    async fn unknown_client_id_has_no_live_handle() {
        let manager = ConnectionManager::new();
        assert!(manager.get("nobody").await.is_none());
    }
}
