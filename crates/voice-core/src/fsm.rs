//! Conversation finite-state machine.
//!
//! Grounded in `app/domain/state/conversation_state.py::ConversationFSM`: the
//! transition table, `can_speak`/`can_interrupt` gates, and the capped
//! transition history are ported verbatim; the Python's `asyncio.Lock` becomes
//! a `tokio::sync::Mutex`.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    Idle,
    Listening,
    Processing,
    Speaking,
    Interrupted,
    ToolExecuting,
    Ending,
}

impl ConversationState {
    fn allowed_targets(self) -> &'static [ConversationState] {
        use ConversationState::{Ending, Idle, Interrupted, Listening, Processing, Speaking, ToolExecuting};
        match self {
            Idle => &[Listening, Speaking, Ending],
            Listening => &[Processing, Idle],
            Processing => &[Speaking, Listening, ToolExecuting],
            Speaking => &[Interrupted, Idle, Ending],
            Interrupted => &[Listening, Processing],
            ToolExecuting => &[Processing, Speaking],
            Ending => &[],
        }
    }

    fn is_valid_transition(self, to: ConversationState) -> bool {
        self.allowed_targets().contains(&to)
    }
}

#[derive(Debug, Clone)]
pub struct StateTransitionEvent {
    pub from: ConversationState,
    pub to: ConversationState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

struct Inner {
    state: ConversationState,
    history: VecDeque<StateTransitionEvent>,
    state_entered_at: DateTime<Utc>,
}

/// Guards every state transition behind a single lock; transitions that
/// violate the table are rejected (logged, not panicked) and leave the state
/// unchanged.
pub struct ConversationFsm {
    inner: Mutex<Inner>,
}

impl ConversationFsm {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: ConversationState::Idle,
                history: VecDeque::with_capacity(MAX_HISTORY),
                state_entered_at: Utc::now(),
            }),
        }
    }

    pub async fn state(&self) -> ConversationState {
        self.inner.lock().await.state
    }

    /// Attempts `from -> to`. Returns whether the transition was accepted.
    pub async fn transition(&self, to: ConversationState, reason: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let from = inner.state;
        if !from.is_valid_transition(to) {
            tracing::warn!(?from, ?to, reason, "rejected invalid FSM transition");
            return false;
        }
        tracing::info!(?from, ?to, reason, "FSM transition");
        let now = Utc::now();
        if inner.history.len() >= MAX_HISTORY {
            inner.history.pop_front();
        }
        inner.history.push_back(StateTransitionEvent { from, to, reason: reason.to_string(), at: now });
        inner.state = to;
        inner.state_entered_at = now;
        true
    }

    /// Emergency reset bypassing the transition table.
    pub async fn force_idle(&self, reason: &str) {
        let mut inner = self.inner.lock().await;
        let from = inner.state;
        tracing::warn!(?from, reason, "forcing FSM to Idle");
        let now = Utc::now();
        if inner.history.len() >= MAX_HISTORY {
            inner.history.pop_front();
        }
        inner.history.push_back(StateTransitionEvent {
            from,
            to: ConversationState::Idle,
            reason: reason.to_string(),
            at: now,
        });
        inner.state = ConversationState::Idle;
        inner.state_entered_at = now;
    }

    pub async fn can_speak(&self) -> bool {
        matches!(self.state().await, ConversationState::Idle | ConversationState::Processing)
    }

    pub async fn can_interrupt(&self) -> bool {
        matches!(self.state().await, ConversationState::Speaking)
    }

    pub async fn history(&self, last_n: usize) -> Vec<StateTransitionEvent> {
        let inner = self.inner.lock().await;
        inner.history.iter().rev().take(last_n).rev().cloned().collect()
    }

    pub async fn state_duration(&self) -> chrono::Duration {
        let inner = self.inner.lock().await;
        Utc::now() - inner.state_entered_at
    }
}

impl Default for ConversationFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn idle_to_listening_is_allowed() {
        let fsm = ConversationFsm::new();
        assert!(fsm.transition(ConversationState::Listening, "caller spoke").await);
        assert_eq!(fsm.state().await, ConversationState::Listening);
    }

    #[tokio::test]
    async fn listening_to_speaking_is_rejected() {
        let fsm = ConversationFsm::new();
        fsm.transition(ConversationState::Listening, "x").await;
        assert!(!fsm.transition(ConversationState::Speaking, "bad").await);
        assert_eq!(fsm.state().await, ConversationState::Listening);
    }

    #[tokio::test]
    async fn can_speak_only_in_idle_or_processing() {
        let fsm = ConversationFsm::new();
        assert!(fsm.can_speak().await);
        fsm.transition(ConversationState::Listening, "x").await;
        assert!(!fsm.can_speak().await);
        fsm.transition(ConversationState::Processing, "x").await;
        assert!(fsm.can_speak().await);
    }

    #[tokio::test]
    async fn can_interrupt_only_in_speaking() {
        let fsm = ConversationFsm::new();
        fsm.transition(ConversationState::Speaking, "x").await;
        assert!(fsm.can_interrupt().await);
        fsm.transition(ConversationState::Interrupted, "barge-in").await;
        assert!(!fsm.can_interrupt().await);
    }

    #[tokio::test]
    async fn ending_is_terminal() {
        let fsm = ConversationFsm::new();
        fsm.transition(ConversationState::Ending, "hangup").await;
        assert!(!fsm.transition(ConversationState::Idle, "x").await);
    }

    #[tokio::test]
    async fn history_caps_at_fifty_entries() {
        let fsm = ConversationFsm::new();
        for _ in 0..60 {
            fsm.transition(ConversationState::Listening, "a").await;
            fsm.transition(ConversationState::Idle, "b").await;
        }
        assert_eq!(fsm.history(1000).await.len(), 50);
    }
}
