//! Reconnect scheduling.

use std::time::Duration;

/// Delay between a connection terminating and the next attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// After this many consecutive failed attempts, failure logs drop from
/// `warn` to `debug`.
pub const DEBUG_LOG_THRESHOLD: u32 = 10;

/// Fixed-delay, unbounded retry policy. The delay does not grow between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_DELAY)
    }
}

/// Whether a connect failure should be logged at `debug` instead of `warn`.
pub fn is_quiet_failure(consecutive_failures: u32) -> bool {
    consecutive_failures >= DEBUG_LOG_THRESHOLD
}
