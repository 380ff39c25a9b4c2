//! Capped exponential backoff schedule for transient failures.

use std::time::Duration;

/// Retry policy with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Multiplier applied per retry.
    pub multiplier: f64,

    /// Cap on the computed delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// The schedule used for lock acquisition: three retries at
    /// 100ms, 200ms, 400ms, capped at 1s.
    pub fn lock_default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
        }
    }

    /// Returns the delay before retry number `attempt` (zero-based),
    /// capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(millis as u64);
        delay.min(self.max_delay)
    }
}
