//! Idle-monitor decision logic (§4.11).
//!
//! Kept as a pure function of the call's timestamps and retry budget so it's
//! testable without a ticking task; `Orchestrator` drives it from a 1s
//! `tokio::time::interval` loop and acts on the returned `IdleAction`.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleAction {
    None,
    PromptIdle,
    StopMaxDuration,
    StopIdleRetriesExhausted,
}

pub struct IdleThresholds {
    pub idle_timeout_secs: u64,
    pub max_duration_secs: u64,
    pub inactivity_max_retries: u32,
}

/// Max-duration is checked first regardless of speaking state; idle-timeout
/// is only evaluated while the bot isn't speaking, and is gated by the retry
/// budget (§4.11: "emit idle message up to `inactivity_max_retries` times,
/// then stop").
pub fn evaluate(
    thresholds: &IdleThresholds,
    start_time: DateTime<Utc>,
    last_interaction_time: DateTime<Utc>,
    is_bot_speaking: bool,
    retries_so_far: u32,
    now: DateTime<Utc>,
) -> IdleAction {
    if (now - start_time).num_seconds() as u64 > thresholds.max_duration_secs {
        return IdleAction::StopMaxDuration;
    }
    if is_bot_speaking {
        return IdleAction::None;
    }
    if (now - last_interaction_time).num_seconds() as u64 <= thresholds.idle_timeout_secs {
        return IdleAction::None;
    }
    if retries_so_far >= thresholds.inactivity_max_retries {
        return IdleAction::StopIdleRetriesExhausted;
    }
    IdleAction::PromptIdle
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn thresholds() -> IdleThresholds {
        IdleThresholds { idle_timeout_secs: 10, max_duration_secs: 600, inactivity_max_retries: 2 }
    }

    #[test]
    fn max_duration_takes_priority_over_idle() {
        let now = Utc::now();
        let start = now - Duration::seconds(700);
        assert_eq!(evaluate(&thresholds(), start, now, false, 0, now), IdleAction::StopMaxDuration);
    }

    #[test]
    fn bot_speaking_suppresses_idle_check() {
        let now = Utc::now();
        let last = now - Duration::seconds(60);
        assert_eq!(evaluate(&thresholds(), now, last, true, 0, now), IdleAction::None);
    }

    #[test]
    fn retries_exhausted_stops_the_call() {
        let now = Utc::now();
        let last = now - Duration::seconds(60);
        assert_eq!(evaluate(&thresholds(), now, last, false, 2, now), IdleAction::StopIdleRetriesExhausted);
    }

    #[test]
    fn under_retry_budget_prompts_instead_of_stopping() {
        let now = Utc::now();
        let last = now - Duration::seconds(60);
        assert_eq!(evaluate(&thresholds(), now, last, false, 1, now), IdleAction::PromptIdle);
    }

    #[test]
    fn within_idle_window_does_nothing() {
        let now = Utc::now();
        let last = now - Duration::seconds(2);
        assert_eq!(evaluate(&thresholds(), now, last, false, 0, now), IdleAction::None);
    }
}
