//! Rate-limited, key-deduplicating work queue.
//!
//! Admits resource keys from the change feed and yields them to workers,
//! collapsing bursts of updates to the same key and backing off retries
//! per key.

mod rate_limiter;
mod work_queue;

pub use rate_limiter::ItemExponentialBackoff;
pub use work_queue::{RateLimitedQueue, WorkQueue};
