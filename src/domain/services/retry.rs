//! Retry policy for per-file signing

use crate::domain::entities::CancellationToken;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of the cancellation check while backing off
const BACKOFF_SLICE: Duration = Duration::from_millis(100);

/// Bounded retry with linear backoff.
///
/// The delay after attempt `n` is `delay_base * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_base: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, delay_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_base,
        }
    }

    /// A single attempt, no waiting
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay_base(&self) -> Duration {
        self.delay_base
    }

    /// Returns the wait between attempt `attempt` and the next one,
    /// saturating at `Duration::MAX`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.delay_base.saturating_mul(attempt)
    }

    /// Returns the total wait of a file that fails every attempt
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|n| self.delay_after(n))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Sleeps for the backoff after `attempt`, waking early on cancellation.
    ///
    /// Returns false when cancelled. A delay too large to schedule waits
    /// until cancellation.
    pub fn wait_after(&self, attempt: u32, cancellation: &CancellationToken) -> bool {
        let deadline = Instant::now().checked_add(self.delay_after(attempt));
        loop {
            if cancellation.is_cancelled() {
                return false;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => BACKOFF_SLICE,
            };
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(BACKOFF_SLICE));
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}
