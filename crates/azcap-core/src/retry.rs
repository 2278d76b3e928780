//! Retry policy: exponential backoff with jitter, expressed as an
//! explicit state machine so the policy is testable without a transport.

use std::time::Duration;

/// Fraction of the computed delay used as the jitter band (+/- 20%).
const JITTER_RATIO: f64 = 0.2;

/// Exponential backoff with a cap and randomized jitter.
///
/// The delay for attempt `n` is `base * factor^n`, capped at `max`,
/// then jittered by +/- 20% to avoid synchronized retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Calculate the delay for a given retry attempt (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let scale = self.factor.powi(attempt as i32);
        let seconds = self.base.as_secs_f64() * scale;
        let capped = seconds.min(self.max.as_secs_f64());

        let mut delay = Duration::from_secs_f64(capped);

        if self.jitter {
            let jitter_ms = (delay.as_millis() as f64 * JITTER_RATIO) as u64;
            if jitter_ms > 0 {
                let offset = fastrand::u64(0..=(jitter_ms * 2));
                let total_ms = delay.as_millis() as i64 + (offset as i64 - jitter_ms as i64);
                delay = Duration::from_millis(total_ms.max(0) as u64);
            }
        }

        delay
    }
}

/// Configuration for the automatic retry mechanism.
///
/// Total attempts = `max_retries + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

/// Whether an HTTP status should trigger a retry.
///
/// 429 and 5xx are transient; everything else fails fast.
pub fn should_retry_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Result of one request attempt, fed into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    /// Retryable failure. A server-supplied `Retry-After` duration, when
    /// present, overrides the computed backoff delay.
    Transient { retry_after: Option<Duration> },
    Fatal,
}

/// Discrete retry lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration },
    Succeeded,
    FatalFailed,
    RetriesExhausted,
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Transition guard: maps the outcome of `attempt` to the next state.
    ///
    /// Fatal outcomes never enter `Backoff`, and a transient outcome on
    /// the final allowed attempt exhausts the budget.
    pub fn next_state(&self, attempt: u32, outcome: AttemptOutcome) -> RetryState {
        match outcome {
            AttemptOutcome::Success => RetryState::Succeeded,
            AttemptOutcome::Fatal => RetryState::FatalFailed,
            AttemptOutcome::Transient { retry_after } => {
                if attempt >= self.max_retries {
                    RetryState::RetriesExhausted
                } else {
                    let delay = retry_after.unwrap_or_else(|| self.backoff.delay(attempt));
                    RetryState::Backoff { attempt, delay }
                }
            }
        }
    }
}
