//! Sync engine: a fixed pool of workers draining the key queue into the
//! document store.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::EventCache;
use crate::errors::PipelineError;
use crate::processor::to_document;
use crate::queue::RateLimitedQueue;
use event_collector_repository::EventStore;
use event_collector_shared::ResourceKey;

/// Sync engine tuning.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Number of concurrent sync workers.
    pub workers: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { workers: 5 }
    }
}

/// Drains resource keys from the queue and syncs the current snapshot of
/// each into the document store.
pub struct EventCollector {
    queue: RateLimitedQueue<ResourceKey>,
    cache: Arc<dyn EventCache>,
    store: Arc<dyn EventStore>,
    index_name: String,
    config: CollectorConfig,
}

impl Clone for EventCollector {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
            index_name: self.index_name.clone(),
            config: self.config.clone(),
        }
    }
}

impl EventCollector {
    pub fn new(
        queue: RateLimitedQueue<ResourceKey>,
        cache: Arc<dyn EventCache>,
        store: Arc<dyn EventStore>,
        index_name: String,
        config: CollectorConfig,
    ) -> Self {
        Self {
            queue,
            cache,
            store,
            index_name,
            config,
        }
    }

    /// Run the sync engine until shutdown is signalled.
    ///
    /// The target index is created up front; failure there is fatal since
    /// no worker could make progress without it.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), PipelineError> {
        self.store.ensure_index(&self.index_name).await?;
        info!(
            index = %self.index_name,
            workers = self.config.workers,
            "Sync engine started"
        );

        let mut handles = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let collector = self.clone();
            handles.push(tokio::spawn(async move {
                collector.worker_loop(worker_id).await;
            }));
        }

        let _ = shutdown.recv().await;
        info!("Sync engine stopping");
        self.queue.shut_down();

        for handle in handles {
            let _ = handle.await;
        }
        Ok(())
    }

    async fn worker_loop(&self, worker_id: usize) {
        debug!(worker_id, "Worker started");
        while let Some(key) = self.queue.get().await {
            self.process_key(&key).await;
            self.queue.done(&key);
        }
        debug!(worker_id, "Worker stopped");
    }

    /// Sync one key. Every outcome ends the attempt; retry scheduling is
    /// owned entirely by the queue's backoff.
    async fn process_key(&self, key: &ResourceKey) {
        let snapshot = match self.cache.get(key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // A key that cannot be read will not get better by
                // retrying the same stale notification.
                warn!(key = %key, error = %e, "Snapshot lookup failed, dropping key");
                counter!("event_lookup_failures_total").increment(1);
                self.queue.forget(key);
                return;
            }
        };

        let Some(raw) = snapshot else {
            debug!(key = %key, "Object deleted before sync, skipping");
            counter!("events_skipped_deleted_total").increment(1);
            self.queue.forget(key);
            return;
        };

        let document = to_document(&raw);
        match self.store.write_event(&document, &self.index_name).await {
            Ok(()) => {
                debug!(key = %key, "Event synced");
                counter!("events_synced_total").increment(1);
                self.queue.forget(key);
            }
            Err(e) => {
                warn!(
                    key = %key,
                    retries = self.queue.retries(key),
                    error = %e,
                    "Event sync failed, requeueing"
                );
                counter!("event_sync_retries_total").increment(1);
                self.queue.add_rate_limited(key.clone());
            }
        }
    }
}
