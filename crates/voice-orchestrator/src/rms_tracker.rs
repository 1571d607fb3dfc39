//! Peak-RMS accumulator bridging inbound audio frames to the STT processor's
//! per-turn noise classification (§4.6), which wants the loudest RMS observed
//! since the last recognition rather than a per-sample value.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub struct RmsTracker(AtomicU32);

impl RmsTracker {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn observe(&self, rms: f32) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            if rms <= f32::from_bits(current) {
                return;
            }
            match self.0.compare_exchange_weak(current, rms.to_bits(), Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Reads and resets the peak, so each completed turn starts from zero.
    pub fn take(&self) -> f32 {
        f32::from_bits(self.0.swap(0, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_resets_to_zero() {
        let tracker = RmsTracker::new();
        tracker.observe(42.0);
        tracker.observe(10.0);
        assert_eq!(tracker.take(), 42.0);
        assert_eq!(tracker.take(), 0.0);
    }
}
