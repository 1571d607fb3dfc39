//! VAD gating stage.
//!
//! Wraps `voice_core::VadFilter` with the per-call configuration
//! (`min_confidence_chars`, `hallucination_blacklist`) from `AgentConfig`,
//! combining the noise classification of §4.6 with the exact-match
//! blacklist check into one `evaluate` call the STT processor invokes per
//! final recognition.

use tokio::sync::Mutex;
use voice_core::vad_filter::is_blacklisted;
use voice_core::{FilterVerdict, VadFilter};

pub struct VadProcessor {
    filter: Mutex<VadFilter>,
    min_chars: usize,
    blacklist: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadDecision {
    Accept,
    Drop(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Blacklisted,
    Learning,
    ImpactNoise,
    TooQuiet,
}

impl VadProcessor {
    pub fn new(min_chars: usize, blacklist: Vec<String>) -> Self {
        Self { filter: Mutex::new(VadFilter::new()), min_chars, blacklist }
    }

    pub async fn observe_rms(&self, rms: f32) {
        self.filter.lock().await.update(rms);
    }

    /// True once enough turns have been observed for `classify` to leave the
    /// `Learning` verdict behind.
    pub async fn is_calibrated(&self) -> bool {
        self.filter.lock().await.ready()
    }

    pub async fn evaluate(&self, text: &str, turn_rms: f32) -> VadDecision {
        if is_blacklisted(text, &self.blacklist) {
            return VadDecision::Drop(DropReason::Blacklisted);
        }
        let filter = self.filter.lock().await;
        match filter.classify(text, turn_rms, self.min_chars) {
            FilterVerdict::Valid => VadDecision::Accept,
            FilterVerdict::Learning => VadDecision::Drop(DropReason::Learning),
            FilterVerdict::ImpactNoise => VadDecision::Drop(DropReason::ImpactNoise),
            FilterVerdict::TooQuiet => VadDecision::Drop(DropReason::TooQuiet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blacklisted_phrase_is_dropped_even_during_learning() {
        let vad = VadProcessor::new(4, vec!["Mm.".into()]);
        assert_eq!(vad.evaluate("Mm.", 10.0).await, VadDecision::Drop(DropReason::Blacklisted));
    }

    #[tokio::test]
    async fn accepts_normal_speech_once_calibrated() {
        let vad = VadProcessor::new(4, vec![]);
        for _ in 0..10 {
            vad.observe_rms(100.0).await;
        }
        assert_eq!(vad.evaluate("a normal sentence", 100.0).await, VadDecision::Accept);
    }
}
