//! Self-calibrating noise classifier.
//!
//! Grounded in the `AdaptiveInputFilter` class embedded in
//! `app/core/orchestrator.py` (the refined variant, not the simpler, earlier
//! `app/core/vad_filter.py` standalone module -- the orchestrator's copy is the
//! one with the `samples < 50` moving-average/EWMA split and the
//! `IMPACT_NOISE` classification, both of which the standalone file lacks).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Valid,
    Learning,
    ImpactNoise,
    TooQuiet,
}

impl FilterVerdict {
    pub fn should_drop(self) -> bool {
        !matches!(self, FilterVerdict::Valid)
    }
}

/// Per-call running noise profile. `samples < 50` uses a simple arithmetic
/// mean; from 50 samples on it switches to an EWMA with `alpha = 0.01`.
#[derive(Debug, Clone, Default)]
pub struct VadFilter {
    samples: u64,
    avg_rms: f32,
    min_rms: f32,
    max_rms: f32,
}

const EWMA_THRESHOLD: u64 = 50;
const EWMA_ALPHA: f32 = 0.01;
const LEARNING_THRESHOLD: u64 = 5;
const IMPACT_NOISE_RATIO: f32 = 0.8;
const TOO_QUIET_RATIO: f32 = 0.4;

impl VadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once enough samples have been seen to trust `avg_rms` for
    /// diagnostics. Distinct from the stricter `is_learning` gate used by
    /// `classify`, which checks the raw sample count against a lower bound.
    pub fn ready(&self) -> bool {
        self.samples >= LEARNING_THRESHOLD
    }

    fn is_learning(&self) -> bool {
        self.samples < LEARNING_THRESHOLD
    }

    pub fn update(&mut self, rms: f32) {
        if rms <= 0.0 {
            return;
        }
        self.samples += 1;
        if self.samples < EWMA_THRESHOLD {
            self.avg_rms = (self.avg_rms * (self.samples - 1) as f32 + rms) / self.samples as f32;
        } else {
            self.avg_rms = self.avg_rms * (1.0 - EWMA_ALPHA) + rms * EWMA_ALPHA;
        }
        if self.samples == 1 || rms < self.min_rms {
            self.min_rms = rms;
        }
        if rms > self.max_rms {
            self.max_rms = rms;
        }
    }

    /// Classifies one completed turn given its transcript text and peak RMS.
    pub fn classify(&self, text: &str, turn_rms: f32, min_chars: usize) -> FilterVerdict {
        if self.is_learning() {
            return FilterVerdict::Learning;
        }
        if text.chars().count() < min_chars && turn_rms > self.avg_rms * IMPACT_NOISE_RATIO {
            return FilterVerdict::ImpactNoise;
        }
        if turn_rms < self.avg_rms * TOO_QUIET_RATIO {
            return FilterVerdict::TooQuiet;
        }
        FilterVerdict::Valid
    }

    pub fn avg_rms(&self) -> f32 {
        self.avg_rms
    }
}

/// Case-insensitive exact-match blacklist of known hallucinated recognitions.
pub fn is_blacklisted(text: &str, blacklist: &[String]) -> bool {
    let trimmed = text.trim();
    blacklist.iter().any(|phrase| phrase.eq_ignore_ascii_case(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_few_samples_are_a_simple_average() {
        let mut f = VadFilter::new();
        f.update(10.0);
        f.update(20.0);
        assert!((f.avg_rms() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn switches_to_ewma_after_fifty_samples() {
        let mut f = VadFilter::new();
        for _ in 0..49 {
            f.update(10.0);
        }
        let before = f.avg_rms();
        f.update(100.0);
        // under EWMA(alpha=0.01), a single outlier barely moves the average
        assert!(f.avg_rms() - before < 1.0);
    }

    #[test]
    fn learning_phase_always_accepts() {
        let mut f = VadFilter::new();
        f.update(50.0);
        assert_eq!(f.classify("hi", 1000.0, 4), FilterVerdict::Learning);
    }

    #[test]
    fn loud_short_utterance_is_impact_noise() {
        let mut f = VadFilter::new();
        for _ in 0..10 {
            f.update(100.0);
        }
        assert_eq!(f.classify("ok", 90.0, 4), FilterVerdict::ImpactNoise);
    }

    #[test]
    fn quiet_utterance_is_too_quiet() {
        let mut f = VadFilter::new();
        for _ in 0..10 {
            f.update(100.0);
        }
        assert_eq!(f.classify("a longer sentence here", 30.0, 4), FilterVerdict::TooQuiet);
    }

    #[test]
    fn normal_utterance_is_valid() {
        let mut f = VadFilter::new();
        for _ in 0..10 {
            f.update(100.0);
        }
        assert_eq!(f.classify("a normal sentence", 100.0, 4), FilterVerdict::Valid);
    }

    #[test]
    fn blacklist_matches_case_insensitively() {
        let list = vec!["Mm.".to_string()];
        assert!(is_blacklisted("mm.", &list));
        assert!(!is_blacklisted("Mm. ok", &list));
    }
}
