//! Transaction retry configuration
//!
//! Contains RetryConfig for the mutation retry driver and its backoff
//! schedule.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for mutation retry behavior
///
/// Every mutation is retried on version conflict until it commits or
/// `max_attempts` attempts have been made. `max_attempts` counts every
/// attempt, the first included, so the default of 5 means at most five reads
/// and five commit calls.
///
/// # Example
/// ```ignore
/// let config = RetryConfig::new()
///     .with_max_attempts(8)
///     .with_base_delay_ms(1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before giving up with `TransactionExhausted` (minimum 1)
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1,
            max_delay_ms: 20,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig that makes a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Create a RetryConfig that retries immediately, without sleeping
    pub fn no_backoff() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Set the attempt bound
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between attempts
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Attempt bound actually enforced (never zero)
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Upper bound of the delay after the given failed attempt (0-based)
    pub(crate) fn calculate_delay(&self, attempt: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = attempt.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Delay drawn uniformly from `[0, calculate_delay(attempt)]`
    pub(crate) fn jittered_delay<R: Rng + ?Sized>(&self, attempt: usize, rng: &mut R) -> Duration {
        let cap = u64::try_from(self.calculate_delay(attempt).as_micros()).unwrap_or(u64::MAX);
        if cap == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rng.gen_range(0..=cap))
    }
}
