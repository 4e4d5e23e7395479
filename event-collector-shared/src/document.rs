//! Persisted document shape for the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened, denormalized representation of one event as stored in the
/// search index.
///
/// Field names on the wire are PascalCase to match the index template
/// mapping. One `RawEvent` maps to exactly one `EventDocument`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    #[serde(rename = "Type")]
    pub event_type: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Kind")]
    pub kind: String,
    #[serde(rename = "RelatedName", default)]
    pub related_name: String,
    #[serde(rename = "RelatedKind", default)]
    pub related_kind: String,
    #[serde(rename = "RelatedNamespace", default)]
    pub related_namespace: String,
    #[serde(rename = "InvolvedObjectNamespace")]
    pub involved_object_namespace: String,
    #[serde(rename = "InvolvedObjectKind")]
    pub involved_object_kind: String,
    #[serde(rename = "InvolvedObjectName")]
    pub involved_object_name: String,
    /// Unset when the source timestamp was absent or unparseable.
    #[serde(rename = "EventTime", default)]
    pub event_time: Option<DateTime<Utc>>,
    #[serde(rename = "Count", default)]
    pub count: i64,
}

/// Decoded search hits plus the store-reported total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSearchResults {
    pub events: Vec<EventDocument>,
    pub total: u64,
}
