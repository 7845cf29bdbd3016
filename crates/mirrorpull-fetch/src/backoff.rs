//! Retry delay policy.

use std::time::Duration;

/// Capped exponential backoff: `min(base * 2^attempt, cap)`.
///
/// Deterministic and monotonically non-decreasing in `attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Base delay, doubled on every attempt.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
}

impl BackoffPolicy {
    /// Default base delay (1 second).
    pub const DEFAULT_BASE: Duration = Duration::from_secs(1);

    /// Default delay cap (60 seconds).
    pub const DEFAULT_CAP: Duration = Duration::from_secs(60);

    /// Creates a policy with the given base and cap.
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Returns the delay to wait after failed attempt number `attempt`.
    ///
    /// Attempts are counted from 1; 0 is treated as 1.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.clamp(1, 31);
        self.base.saturating_mul(1u32 << exponent).min(self.cap)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_CAP)
    }
}
