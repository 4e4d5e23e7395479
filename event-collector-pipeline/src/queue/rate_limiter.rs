//! Per-item exponential backoff tracking.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

/// Default base delay for the first retry of an item.
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);

/// Default cap on the retry delay.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

/// Exponential backoff keyed by item.
///
/// Each consecutive failure of an item doubles its next delay, starting at
/// the base delay and capped at the maximum. [`forget`](Self::forget) resets
/// an item back to the base delay.
#[derive(Debug)]
pub struct ItemExponentialBackoff<T> {
    base_delay: Duration,
    max_delay: Duration,
    failures: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash> ItemExponentialBackoff<T> {
    /// Create a backoff tracker with custom base and cap.
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            failures: HashMap::new(),
        }
    }

    /// The delay to apply for this item's next retry, recording one more
    /// failure.
    pub fn when(&mut self, item: &T) -> Duration {
        let failures = self.failures.entry(item.clone()).or_insert(0);
        let exponent = *failures;
        *failures += 1;

        let delay = self
            .base_delay
            .checked_mul(2u32.saturating_pow(exponent))
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }

    /// Clear backoff state for an item after success (or abandonment).
    pub fn forget(&mut self, item: &T) {
        self.failures.remove(item);
    }

    /// Number of consecutive failures recorded for an item.
    pub fn retries(&self, item: &T) -> u32 {
        self.failures.get(item).copied().unwrap_or(0)
    }
}

impl<T: Clone + Eq + Hash> Default for ItemExponentialBackoff<T> {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}
