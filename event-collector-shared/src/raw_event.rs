//! Snapshot of an event resource as read from the feed's local cache.

use crate::ResourceKey;

/// Reference to a cluster object mentioned by an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectRef {
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

/// A point-in-time snapshot of one event resource.
///
/// Read fresh from the change feed's cache on every processing attempt and
/// never retained by the pipeline. `last_timestamp` carries the raw RFC 3339
/// string; parsing happens during document transformation and fails closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    /// Name of the event resource itself.
    pub name: String,
    /// Namespace of the event resource itself.
    pub namespace: String,
    /// Number of occurrences this event represents.
    pub count: i64,
    /// Machine-readable reason code (e.g. "Killing").
    pub reason: String,
    /// Human-readable message.
    pub message: String,
    /// Type tag, "Normal" or "Warning".
    pub event_type: String,
    /// Action that was taken or failed, if reported.
    pub action: String,
    /// Kind of the event resource (usually empty on the wire).
    pub kind: String,
    /// The object this event describes.
    pub involved_object: ObjectRef,
    /// Optional secondary object the event references.
    pub related_object: Option<ObjectRef>,
    /// Last-observed timestamp as an RFC 3339 string, if present.
    pub last_timestamp: Option<String>,
}

impl RawEvent {
    /// The dedup/queue key for this event.
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }
}
