//! STT adapter stage.
//!
//! Drives `SttPort::next_event` in a loop. On a **final** recognition: resets
//! the idle timer, applies VAD + blacklist filtering (§4.6), and -- the echo
//! guard from §4.10 -- if the bot is currently speaking and the recognition is
//! short and not a stop word, treats it as mic bleed-through and discards it
//! rather than forwarding it as a barge-in.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use voice_core::domain::{Role, TextFrame};
use voice_core::{ConversationFsm, ControlChannel, SttPort};

use crate::processors::vad::VadProcessor;

pub struct SttProcessor {
    stt: Arc<dyn SttPort>,
    vad: Arc<VadProcessor>,
    fsm: Arc<ConversationFsm>,
    control: Arc<ControlChannel>,
    interruption_threshold_chars: usize,
    stop_words: Vec<String>,
    last_activity_ms: Arc<AtomicI64>,
}

impl SttProcessor {
    pub fn new(
        stt: Arc<dyn SttPort>,
        vad: Arc<VadProcessor>,
        fsm: Arc<ConversationFsm>,
        control: Arc<ControlChannel>,
        interruption_threshold_chars: usize,
        stop_words: Vec<String>,
        last_activity_ms: Arc<AtomicI64>,
    ) -> Self {
        Self { stt, vad, fsm, control, interruption_threshold_chars, stop_words, last_activity_ms }
    }

    fn is_stop_word(&self, text: &str) -> bool {
        let lower = text.trim().to_lowercase();
        self.stop_words.iter().any(|w| lower == w.to_lowercase())
    }

    /// Runs until the STT port's event stream ends. `turn_rms` is the peak
    /// RMS measured over the just-completed turn (supplied by the caller,
    /// who owns the raw audio the recognition was derived from).
    pub async fn run(
        &self,
        mut turn_rms: impl FnMut() -> f32 + Send,
        out_tx: tokio::sync::mpsc::Sender<TextFrame>,
    ) {
        while let Some(event) = self.stt.next_event().await {
            self.last_activity_ms.store(now_ms(), Ordering::SeqCst);

            if event.is_partial {
                continue;
            }

            let rms = turn_rms();
            self.vad.observe_rms(rms).await;
            let bot_speaking = self.fsm.can_interrupt().await; // can_interrupt() true iff Speaking
            if bot_speaking
                && event.text.chars().count() < self.interruption_threshold_chars
                && !self.is_stop_word(&event.text)
            {
                tracing::debug!(text = %event.text, "discarding likely echo");
                continue;
            }

            match self.vad.evaluate(&event.text, rms).await {
                crate::processors::vad::VadDecision::Drop(reason) => {
                    tracing::debug!(?reason, text = %event.text, "dropping recognition");
                    continue;
                }
                crate::processors::vad::VadDecision::Accept => {}
            }

            if bot_speaking && self.fsm.can_interrupt().await {
                self.control.send_interrupt(Some(event.text.clone())).await;
            }

            let frame = TextFrame::new(event.text, Role::User);
            if out_tx.send(frame).await.is_err() {
                return;
            }
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Mutex as AsyncMutex;
    use voice_core::domain::{AudioFrame, TranscriptEvent};
    use voice_core::error::CoreError;

    struct FakeStt {
        events: AsyncMutex<VecDeque<TranscriptEvent>>,
    }

    #[async_trait]
    impl SttPort for FakeStt {
        async fn start(&self, _language: &str) -> Result<(), CoreError> {
            Ok(())
        }
        async fn push_audio(&self, _frame: AudioFrame) -> Result<(), CoreError> {
            Ok(())
        }
        async fn next_event(&self) -> Option<TranscriptEvent> {
            self.events.lock().await.pop_front()
        }
        async fn stop(&self) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn final_event(text: &str) -> TranscriptEvent {
        TranscriptEvent { role: Role::User, text: text.to_string(), is_partial: false, trace_id: "t".into(), ts: chrono::Utc::now() }
    }

    /// Wires `run()` end to end against a fake provider: every final
    /// recognition must feed the VAD filter's running average, not just its
    /// classification, or the filter never leaves `Learning`.
    #[tokio::test]
    async fn final_recognitions_calibrate_the_vad_filter() {
        let mut events = VecDeque::new();
        for _ in 0..6 {
            events.push_back(final_event("a normal length sentence"));
        }
        let stt = Arc::new(FakeStt { events: AsyncMutex::new(events) });
        let vad = Arc::new(VadProcessor::new(4, vec![]));
        let fsm = Arc::new(ConversationFsm::new());
        let control = Arc::new(ControlChannel::new());
        let last_activity = Arc::new(AtomicI64::new(0));
        let processor = SttProcessor::new(stt, Arc::clone(&vad), fsm, control, 5, vec![], last_activity);
        let (tx, mut rx) = tokio::sync::mpsc::channel(16);

        processor.run(|| 100.0, tx).await;
        while rx.try_recv().is_ok() {}

        assert!(vad.is_calibrated().await);
    }
}
