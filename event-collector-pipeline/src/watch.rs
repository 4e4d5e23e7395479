//! Cluster change feed.
//!
//! Watches event resources, mirrors them into the reflector store the
//! cache reads from, and enqueues resource keys for the sync workers.

use std::collections::{HashMap, HashSet};

use futures::{pin_mut, StreamExt};
use k8s_openapi::api::core::v1::Event;
use kube::api::Api;
use kube::runtime::reflector;
use kube::runtime::reflector::store::Writer;
use kube::runtime::watcher::{self, watcher, Event as WatchEvent};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::queue::RateLimitedQueue;
use event_collector_shared::ResourceKey;

/// Tracks the last version enqueued per key so periodic full
/// resynchronizations do not flood the queue with unchanged objects.
#[derive(Default)]
struct FeedState {
    last_seen: HashMap<ResourceKey, String>,
}

impl FeedState {
    fn enqueue_if_changed(&mut self, event: &Event, queue: &RateLimitedQueue<ResourceKey>) {
        let Some(key) = key_of(event) else {
            warn!("Skipping event object without namespace and name");
            return;
        };
        let version = event.metadata.resource_version.clone().unwrap_or_default();
        if self.last_seen.get(&key) == Some(&version) {
            debug!(key = %key, "Skipping unchanged object on resync");
            return;
        }
        self.last_seen.insert(key.clone(), version);
        queue.add(key);
    }

    fn enqueue_deleted(&mut self, event: &Event, queue: &RateLimitedQueue<ResourceKey>) {
        let Some(key) = key_of(event) else {
            warn!("Skipping deleted event object without namespace and name");
            return;
        };
        self.last_seen.remove(&key);
        queue.add(key);
    }

    fn handle(&mut self, event: WatchEvent<Event>, queue: &RateLimitedQueue<ResourceKey>) {
        match event {
            WatchEvent::Applied(obj) => self.enqueue_if_changed(&obj, queue),
            WatchEvent::Deleted(obj) => self.enqueue_deleted(&obj, queue),
            WatchEvent::Restarted(objects) => {
                debug!(objects = objects.len(), "Change feed restarted, resyncing");
                let live: HashSet<ResourceKey> = objects.iter().filter_map(key_of).collect();
                self.last_seen.retain(|key, _| live.contains(key));
                for obj in &objects {
                    self.enqueue_if_changed(obj, queue);
                }
            }
        }
    }
}

fn key_of(event: &Event) -> Option<ResourceKey> {
    let namespace = event.metadata.namespace.as_deref()?;
    let name = event.metadata.name.as_deref()?;
    Some(ResourceKey::new(namespace, name))
}

/// Run the change feed until shutdown is signalled.
///
/// The watcher restarts itself on transient failures; individual stream
/// errors are logged and the feed keeps going.
pub async fn run_event_feed(
    client: kube::Client,
    queue: RateLimitedQueue<ResourceKey>,
    writer: Writer<Event>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let api: Api<Event> = Api::all(client);
    let stream = reflector(writer, watcher(api, watcher::Config::default()));
    pin_mut!(stream);

    let mut state = FeedState::default();
    info!("Change feed started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Change feed stopping");
                return;
            }
            next = stream.next() => {
                match next {
                    Some(Ok(event)) => state.handle(event, &queue),
                    Some(Err(e)) => warn!(error = %e, "Change feed error, retrying"),
                    None => {
                        warn!("Change feed stream ended");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn event(namespace: &str, name: &str, version: &str) -> Event {
        Event {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                name: Some(name.to_string()),
                resource_version: Some(version.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_applied_enqueues_key() {
        let queue = RateLimitedQueue::new();
        let mut state = FeedState::default();

        state.handle(WatchEvent::Applied(event("ns", "e1", "100")), &queue);

        assert_eq!(queue.get().await, Some(ResourceKey::new("ns", "e1")));
    }

    #[tokio::test]
    async fn test_unchanged_version_is_skipped_on_resync() {
        let queue = RateLimitedQueue::new();
        let mut state = FeedState::default();

        state.handle(WatchEvent::Applied(event("ns", "e1", "100")), &queue);
        let key = queue.get().await.unwrap();
        queue.done(&key);

        state.handle(WatchEvent::Applied(event("ns", "e1", "100")), &queue);
        assert!(queue.is_empty());

        state.handle(WatchEvent::Applied(event("ns", "e1", "101")), &queue);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_enqueues_and_forgets_version() {
        let queue = RateLimitedQueue::new();
        let mut state = FeedState::default();

        state.handle(WatchEvent::Applied(event("ns", "e1", "100")), &queue);
        let key = queue.get().await.unwrap();
        queue.done(&key);

        state.handle(WatchEvent::Deleted(event("ns", "e1", "100")), &queue);
        let key = queue.get().await.unwrap();
        assert_eq!(key, ResourceKey::new("ns", "e1"));
        queue.done(&key);

        // After a delete the same version must enqueue again.
        state.handle(WatchEvent::Applied(event("ns", "e1", "100")), &queue);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_restarted_drops_stale_keys_and_enqueues_changed() {
        let queue = RateLimitedQueue::new();
        let mut state = FeedState::default();

        state.handle(WatchEvent::Applied(event("ns", "gone", "1")), &queue);
        state.handle(WatchEvent::Applied(event("ns", "kept", "1")), &queue);
        for _ in 0..2 {
            let key = queue.get().await.unwrap();
            queue.done(&key);
        }

        state.handle(
            WatchEvent::Restarted(vec![event("ns", "kept", "1"), event("ns", "new", "7")]),
            &queue,
        );

        // "kept" is unchanged, "new" was never seen.
        assert_eq!(queue.get().await, Some(ResourceKey::new("ns", "new")));
        assert!(queue.is_empty());

        // "gone" was pruned, so its old version enqueues again.
        state.handle(WatchEvent::Applied(event("ns", "gone", "1")), &queue);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_object_without_name_is_ignored() {
        let queue = RateLimitedQueue::new();
        let mut state = FeedState::default();

        let mut obj = event("ns", "e1", "1");
        obj.metadata.name = None;
        state.handle(WatchEvent::Applied(obj), &queue);

        assert!(queue.is_empty());
    }
}
