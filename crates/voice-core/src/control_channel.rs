//! Out-of-band control signal delivery.
//!
//! Grounded in `app/core/control_channel.py::ControlChannel`: one-slot,
//! latest-wins semantics so a barge-in is never stuck behind an older,
//! already-stale signal. `asyncio.Event` + `asyncio.Lock` becomes
//! `tokio::sync::Notify` + `tokio::sync::Mutex`.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Interrupt { text: Option<String> },
    Cancel { reason: Option<String> },
    Clear,
    EmergencyStop { reason: Option<String> },
    Pause,
    Resume,
}

#[derive(Debug, Clone)]
pub struct ControlMessage {
    pub signal: ControlSignal,
    pub metadata: Value,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ControlStats {
    pub signals_sent: u64,
    pub signals_received: u64,
}

struct Inner {
    message: Option<ControlMessage>,
    stats: ControlStats,
}

pub struct ControlChannel {
    notify: Notify,
    inner: Mutex<Inner>,
}

impl ControlChannel {
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
            inner: Mutex::new(Inner { message: None, stats: ControlStats::default() }),
        }
    }

    /// Overwrites any unconsumed pending message (latest-wins).
    pub async fn send(&self, signal: ControlSignal, metadata: Value) {
        let mut inner = self.inner.lock().await;
        tracing::debug!(?signal, "control channel send");
        inner.message = Some(ControlMessage { signal, metadata });
        inner.stats.signals_sent += 1;
        self.notify.notify_one();
    }

    pub async fn send_interrupt(&self, text: impl Into<Option<String>>) {
        self.send(ControlSignal::Interrupt { text: text.into() }, Value::Null).await;
    }

    pub async fn send_cancel(&self, reason: impl Into<Option<String>>) {
        self.send(ControlSignal::Cancel { reason: reason.into() }, Value::Null).await;
    }

    pub async fn send_emergency_stop(&self, reason: impl Into<Option<String>>) {
        self.send(ControlSignal::EmergencyStop { reason: reason.into() }, Value::Null).await;
    }

    /// Blocks until a signal is available (or `timeout` elapses), then pops and clears it.
    pub async fn wait(&self, timeout: Option<Duration>) -> Option<ControlMessage> {
        loop {
            {
                let mut inner = self.inner.lock().await;
                if let Some(msg) = inner.message.take() {
                    inner.stats.signals_received += 1;
                    return Some(msg);
                }
            }
            let notified = self.notify.notified();
            match timeout {
                Some(d) => {
                    if tokio::time::timeout(d, notified).await.is_err() {
                        return None;
                    }
                }
                None => notified.await,
            }
        }
    }

    pub async fn has_pending(&self) -> bool {
        self.inner.lock().await.message.is_some()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.message = None;
    }

    pub async fn stats(&self) -> ControlStats {
        self.inner.lock().await.stats
    }
}

impl Default for ControlChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_wins_without_interleaved_wait() {
        let ch = ControlChannel::new();
        ch.send_interrupt(Some("one".to_string())).await;
        ch.send_interrupt(Some("two".to_string())).await;
        let msg = ch.wait(None).await.unwrap();
        assert_eq!(msg.signal, ControlSignal::Interrupt { text: Some("two".to_string()) });
        let stats = ch.stats().await;
        assert_eq!(stats.signals_sent, 2);
        assert_eq!(stats.signals_received, 1);
    }

    #[tokio::test]
    async fn wait_times_out_with_no_signal() {
        let ch = ControlChannel::new();
        let result = ch.wait(Some(Duration::from_millis(10))).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn clear_drops_pending_message() {
        let ch = ControlChannel::new();
        ch.send_cancel(None).await;
        ch.clear().await;
        assert!(!ch.has_pending().await);
    }
}
