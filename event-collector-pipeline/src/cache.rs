//! Read access to the change feed's local cache.
//!
//! Workers never act on the notification payload itself; they read the
//! current snapshot for a key at processing time, so a burst of updates
//! collapses into one write of the latest state.

use k8s_openapi::api::core::v1::Event;
use kube::runtime::reflector::{ObjectRef, Store};

use crate::errors::PipelineError;
use event_collector_shared::{ObjectRef as EventObjectRef, RawEvent, ResourceKey};

/// Point-in-time lookup of an event resource by key.
///
/// `Ok(None)` means the resource was deleted between enqueue and
/// processing.
pub trait EventCache: Send + Sync {
    fn get(&self, key: &ResourceKey) -> Result<Option<RawEvent>, PipelineError>;
}

/// [`EventCache`] backed by the kube reflector store the watcher maintains.
pub struct KubeEventCache {
    store: Store<Event>,
}

impl KubeEventCache {
    pub fn new(store: Store<Event>) -> Self {
        Self { store }
    }
}

impl EventCache for KubeEventCache {
    fn get(&self, key: &ResourceKey) -> Result<Option<RawEvent>, PipelineError> {
        let obj_ref = ObjectRef::new(&key.name).within(&key.namespace);
        Ok(self.store.get(&obj_ref).map(|event| to_raw_event(&event)))
    }
}

/// Flatten a cluster event object into the pipeline's snapshot type.
pub fn to_raw_event(event: &Event) -> RawEvent {
    RawEvent {
        name: event.metadata.name.clone().unwrap_or_default(),
        namespace: event.metadata.namespace.clone().unwrap_or_default(),
        count: i64::from(event.count.unwrap_or(0)),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        event_type: event.type_.clone().unwrap_or_default(),
        action: event.action.clone().unwrap_or_default(),
        kind: String::new(),
        involved_object: EventObjectRef {
            namespace: event.involved_object.namespace.clone().unwrap_or_default(),
            kind: event.involved_object.kind.clone().unwrap_or_default(),
            name: event.involved_object.name.clone().unwrap_or_default(),
        },
        related_object: event.related.as_ref().map(|related| EventObjectRef {
            namespace: related.namespace.clone().unwrap_or_default(),
            kind: related.kind.clone().unwrap_or_default(),
            name: related.name.clone().unwrap_or_default(),
        }),
        last_timestamp: event
            .last_timestamp
            .as_ref()
            .map(|time| time.0.to_rfc3339()),
    }
}
