//! Retry policy for delivery operations.
//!
//! Two delays are derived from the number of attempts made with the current
//! provider:
//! - after a synchronous send failure: `unit * 2^attempts`
//! - after a failure receipt: `unit * receipt_failure_multiplier * 2^attempts`
//!
//! Both are capped at `max_backoff_secs`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy configuration for delivery operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempts with one provider before failing over to the next.
    ///
    /// The provider is dropped once its attempt count *exceeds* this value,
    /// so it is sent to `max_attempts_per_provider + 1` times in total.
    ///
    /// Default: 3
    #[serde(default = "defaults::max_attempts_per_provider")]
    pub max_attempts_per_provider: u32,

    /// Base unit for exponential backoff (in milliseconds).
    ///
    /// Default: 1000 (one second)
    #[serde(default = "defaults::backoff_unit_ms")]
    pub backoff_unit_ms: u64,

    /// Extra factor applied to the backoff before resending after a failure
    /// receipt.
    ///
    /// Default: 3
    #[serde(default = "defaults::receipt_failure_multiplier")]
    pub receipt_failure_multiplier: u64,

    /// Maximum backoff (in seconds).
    ///
    /// Default: 3600 seconds (1 hour)
    #[serde(default = "defaults::max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts_per_provider: defaults::max_attempts_per_provider(),
            backoff_unit_ms: defaults::backoff_unit_ms(),
            receipt_failure_multiplier: defaults::receipt_failure_multiplier(),
            max_backoff_secs: defaults::max_backoff_secs(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current provider has used up its attempts and must be
    /// dropped before the next send.
    #[must_use]
    pub const fn should_abandon_provider(&self, attempts_with_provider: u32) -> bool {
        attempts_with_provider > self.max_attempts_per_provider
    }

    /// Delay before retrying after a synchronous send failure.
    #[must_use]
    pub fn send_backoff(&self, attempts_with_provider: u32) -> Duration {
        self.backoff(attempts_with_provider, 1)
    }

    /// Delay before resending after a provider reported the delivery failed.
    #[must_use]
    pub fn receipt_backoff(&self, attempts_with_provider: u32) -> Duration {
        self.backoff(attempts_with_provider, self.receipt_failure_multiplier)
    }

    fn backoff(&self, attempts: u32, multiplier: u64) -> Duration {
        let max = Duration::from_secs(self.max_backoff_secs);

        // 2^64 would overflow
        if attempts >= 64 {
            return max;
        }

        let millis = self
            .backoff_unit_ms
            .saturating_mul(multiplier)
            .saturating_mul(1u64 << attempts);

        Duration::from_millis(millis).min(max)
    }
}

mod defaults {
    pub const fn max_attempts_per_provider() -> u32 {
        3
    }

    pub const fn backoff_unit_ms() -> u64 {
        1000
    }

    pub const fn receipt_failure_multiplier() -> u64 {
        3
    }

    pub const fn max_backoff_secs() -> u64 {
        3600 // 1 hour
    }
}
