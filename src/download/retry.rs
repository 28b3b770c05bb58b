//! Retry policy with exponential backoff for failed transfer attempts.
//!
//! Every failed attempt is retried until the attempt limit is reached; there
//! is no classification of "permanent" failures. The wait before the next
//! attempt doubles each time:
//!
//! ```text
//! delay(k) = min(unit * 2^k, max_delay)     k = number of failed attempts so far
//! ```
//!
//! With the default one second unit, the first retry waits 2s, the second 4s.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use transfer_core::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::with_max_attempts(3);
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(2));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { .. } => unreachable!(),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::constants::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_BACKOFF};

/// Default maximum attempts per transfer.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the transfer after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the transfer.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `unit`: 1 second
/// - `max_delay`: 60 seconds
/// - `backoff_multiplier`: 2.0
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Time unit scaled by `multiplier^attempt`.
    unit: Duration,

    /// Maximum delay cap.
    max_delay: Duration,

    /// Multiplier applied each attempt.
    backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            unit: DEFAULT_BACKOFF_UNIT,
            max_delay: DEFAULT_MAX_BACKOFF,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Maximum attempts including initial (clamped to >= 1)
    /// * `unit` - Backoff time unit
    /// * `max_delay` - Maximum delay cap
    /// * `backoff_multiplier` - Multiplier for exponential increase
    #[must_use]
    pub fn new(
        max_attempts: u32,
        unit: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Creates a policy with a custom `max_attempts`, using defaults for other settings.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff time unit.
    #[must_use]
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Returns the backoff cap.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Determines whether to retry after `attempt` (1-indexed) has failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.backoff_delay(attempt);

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Calculates the wait that follows the `attempt`-th failure.
    ///
    /// Formula: `min(unit * multiplier^attempt, max_delay)`. Non-decreasing in `attempt`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let unit_ms = self.unit.as_millis() as f64;
        let delay_ms = unit_ms * self.backoff_multiplier.powf(f64::from(attempt));
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.unit, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retry_policy_with_max_attempts() {
        let policy = RetryPolicy::with_max_attempts(5);
        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.unit(), Duration::from_secs(1));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        let policy = RetryPolicy::new(0, Duration::from_millis(1), Duration::from_secs(1), 2.0);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_first_failure_waits_two_units() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_respects_max_delay() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(policy.backoff_delay(6), Duration::from_secs(5));
    }

    #[test]
    fn test_delay_is_non_decreasing() {
        let policy = RetryPolicy::new(20, Duration::from_millis(3), Duration::from_secs(30), 2.0);
        let delays: Vec<Duration> = (1..20).map(|k| policy.backoff_delay(k)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]), "{delays:?}");
    }

    #[test]
    fn test_should_retry_until_limit() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_secs(1), 2.0);

        assert_eq!(
            policy.should_retry(1),
            RetryDecision::Retry {
                delay: Duration::from_millis(20),
                attempt: 2
            }
        );
        assert_eq!(
            policy.should_retry(2),
            RetryDecision::Retry {
                delay: Duration::from_millis(40),
                attempt: 3
            }
        );
        match policy.should_retry(3) {
            RetryDecision::DoNotRetry { reason } => assert!(reason.contains("exhausted")),
            other => panic!("expected DoNotRetry, got {other:?}"),
        }
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::with_max_attempts(1);
        assert!(matches!(
            policy.should_retry(1),
            RetryDecision::DoNotRetry { .. }
        ));
    }
}
