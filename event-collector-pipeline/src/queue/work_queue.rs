//! Deduplicating work queue with rate-limited requeueing.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::debug;

use crate::queue::rate_limiter::ItemExponentialBackoff;

struct QueueState<T> {
    queue: VecDeque<T>,
    dirty: HashSet<T>,
    processing: HashSet<T>,
    shutdown: bool,
}

struct Inner<T> {
    state: Mutex<QueueState<T>>,
    notify: Notify,
}

/// Deduplicating work queue.
///
/// Invariants:
/// - an item is queued at most once, no matter how many times it is added;
/// - an item handed to a worker is never handed to a second worker until
///   the first calls [`done`](Self::done);
/// - an item added while it is being processed is requeued exactly once
///   when processing finishes, so no mutation is lost.
pub struct WorkQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Eq + Hash> WorkQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    shutdown: false,
                }),
                notify: Notify::new(),
            }),
        }
    }

    /// Add an item. Idempotent: an item that is already queued or being
    /// processed is not double-queued; an add during processing marks the
    /// item so it is requeued once the in-flight attempt finishes.
    pub fn add(&self, item: T) {
        {
            let mut state = self.inner.state.lock().expect("queue lock poisoned");
            if state.shutdown {
                return;
            }
            if state.dirty.contains(&item) {
                return;
            }
            state.dirty.insert(item.clone());
            if state.processing.contains(&item) {
                // Requeued by done() once the current attempt finishes.
                return;
            }
            state.queue.push_back(item);
        }
        self.inner.notify.notify_one();
    }

    /// Await the next item. Returns `None` once the queue is shut down;
    /// pending items are not drained after shutdown.
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let mut state = self.inner.state.lock().expect("queue lock poisoned");
                if state.shutdown {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    state.dirty.remove(&item);
                    state.processing.insert(item.clone());
                    let more = !state.queue.is_empty();
                    drop(state);
                    // Chain the wakeup so a second waiter is not stranded
                    // when two adds raced a single stored permit.
                    if more {
                        self.inner.notify.notify_one();
                    }
                    return Some(item);
                }
            }
            notified.await;
        }
    }

    /// Release the processing claim on an item, requeueing it if it was
    /// added again while in flight.
    pub fn done(&self, item: &T) {
        let requeued = {
            let mut state = self.inner.state.lock().expect("queue lock poisoned");
            state.processing.remove(item);
            if state.dirty.contains(item) && !state.shutdown {
                state.queue.push_back(item.clone());
                true
            } else {
                false
            }
        };
        if requeued {
            self.inner.notify.notify_one();
        }
    }

    /// Stop accepting new items and unblock all waiting [`get`](Self::get)
    /// calls.
    pub fn shut_down(&self) {
        {
            let mut state = self.inner.state.lock().expect("queue lock poisoned");
            state.shutdown = true;
        }
        self.inner.notify.notify_waiters();
    }

    /// Number of items waiting to be handed out.
    pub fn len(&self) -> usize {
        self.inner.state.lock().expect("queue lock poisoned").queue.len()
    }

    /// Whether the queue has no waiting items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether shutdown has been requested.
    pub fn is_shut_down(&self) -> bool {
        self.inner.state.lock().expect("queue lock poisoned").shutdown
    }
}

impl<T: Clone + Eq + Hash> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`WorkQueue`] with per-item exponential retry backoff.
///
/// `add_rate_limited` requeues a failed item after its backoff delay;
/// `forget` resets the item's delay after a success.
pub struct RateLimitedQueue<T> {
    queue: WorkQueue<T>,
    limiter: Arc<Mutex<ItemExponentialBackoff<T>>>,
}

impl<T> Clone for RateLimitedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<T: Clone + Eq + Hash + Send + Sync + 'static> RateLimitedQueue<T> {
    /// Create a queue with the default backoff (5ms base, 1000s cap).
    pub fn new() -> Self {
        Self::with_backoff(ItemExponentialBackoff::default())
    }

    /// Create a queue with a custom backoff policy.
    pub fn with_backoff(limiter: ItemExponentialBackoff<T>) -> Self {
        Self {
            queue: WorkQueue::new(),
            limiter: Arc::new(Mutex::new(limiter)),
        }
    }

    /// See [`WorkQueue::add`].
    pub fn add(&self, item: T) {
        self.queue.add(item);
    }

    /// See [`WorkQueue::get`].
    pub async fn get(&self) -> Option<T> {
        self.queue.get().await
    }

    /// See [`WorkQueue::done`].
    pub fn done(&self, item: &T) {
        self.queue.done(item);
    }

    /// Requeue an item after its exponential backoff delay.
    pub fn add_rate_limited(&self, item: T) {
        let delay = self
            .limiter
            .lock()
            .expect("limiter lock poisoned")
            .when(&item);
        debug!(delay_ms = delay.as_millis() as u64, "Requeueing after backoff");

        let queue = self.queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Dropped silently if the queue shut down in the meantime.
            queue.add(item);
        });
    }

    /// Clear the backoff state for an item.
    pub fn forget(&self, item: &T) {
        self.limiter
            .lock()
            .expect("limiter lock poisoned")
            .forget(item);
    }

    /// Consecutive failures recorded for an item.
    pub fn retries(&self, item: &T) -> u32 {
        self.limiter
            .lock()
            .expect("limiter lock poisoned")
            .retries(item)
    }

    /// See [`WorkQueue::shut_down`].
    pub fn shut_down(&self) {
        self.queue.shut_down();
    }

    /// See [`WorkQueue::len`].
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// See [`WorkQueue::is_empty`].
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T: Clone + Eq + Hash + Send + Sync + 'static> Default for RateLimitedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_add_deduplicates() {
        let queue: WorkQueue<&str> = WorkQueue::new();

        queue.add("k");
        queue.add("k");
        queue.add("k");

        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_added_item() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("k");

        assert_eq!(queue.get().await, Some("k"));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_item_not_redelivered_while_processing() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("k");

        let item = queue.get().await.unwrap();
        assert_eq!(item, "k");

        // The same key must not reach a second worker while in flight.
        queue.add("k");
        assert!(queue.is_empty());

        let second = timeout(Duration::from_millis(50), queue.get()).await;
        assert!(second.is_err(), "second get should stay blocked");
    }

    #[tokio::test]
    async fn test_add_during_processing_requeues_on_done() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("k");

        let item = queue.get().await.unwrap();
        queue.add("k");
        assert!(queue.is_empty());

        queue.done(&item);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("k"));
    }

    #[tokio::test]
    async fn test_done_without_dirty_does_not_requeue() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("k");

        let item = queue.get().await.unwrap();
        queue.done(&item);

        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_get_unblocks_on_add() {
        let queue: WorkQueue<&str> = WorkQueue::new();

        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.get().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.add("k");

        let got = timeout(Duration::from_millis(200), waiter)
            .await
            .expect("get did not unblock")
            .unwrap();
        assert_eq!(got, Some("k"));
    }

    #[tokio::test]
    async fn test_shutdown_unblocks_all_getters() {
        let queue: WorkQueue<&str> = WorkQueue::new();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let queue = queue.clone();
                tokio::spawn(async move { queue.get().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.shut_down();

        for waiter in waiters {
            let got = timeout(Duration::from_millis(200), waiter)
                .await
                .expect("get did not unblock on shutdown")
                .unwrap();
            assert_eq!(got, None);
        }
    }

    #[tokio::test]
    async fn test_shutdown_drops_pending_and_rejects_adds() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.add("pending");
        queue.shut_down();

        assert_eq!(queue.get().await, None);

        queue.add("late");
        assert_eq!(queue.get().await, None);
    }

    #[tokio::test]
    async fn test_rate_limited_requeue_lands_after_delay() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::with_backoff(
            ItemExponentialBackoff::new(Duration::from_millis(10), Duration::from_secs(1)),
        );

        queue.add_rate_limited("k");
        assert!(queue.is_empty());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.retries(&"k"), 1);
    }

    #[tokio::test]
    async fn test_forget_resets_backoff_between_failures() {
        let queue: RateLimitedQueue<&str> = RateLimitedQueue::new();

        queue.add_rate_limited("k");
        queue.add_rate_limited("k");
        assert_eq!(queue.retries(&"k"), 2);

        queue.forget(&"k");
        assert_eq!(queue.retries(&"k"), 0);
    }
}
