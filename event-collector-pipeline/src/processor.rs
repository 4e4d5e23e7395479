//! Snapshot to document transformation.

use chrono::{DateTime, Utc};
use tracing::warn;

use event_collector_shared::{EventDocument, RawEvent};

/// Build the searchable document for an event snapshot.
///
/// The timestamp is the only parsed field: a malformed value is dropped
/// with a warning rather than failing the whole document.
pub fn to_document(raw: &RawEvent) -> EventDocument {
    let event_time = raw.last_timestamp.as_deref().and_then(|ts| {
        match DateTime::parse_from_rfc3339(ts) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(e) => {
                warn!(
                    namespace = %raw.namespace,
                    name = %raw.name,
                    timestamp = %ts,
                    error = %e,
                    "Dropping unparseable event timestamp"
                );
                None
            }
        }
    });

    let related = raw.related_object.as_ref();

    EventDocument {
        event_type: raw.event_type.clone(),
        message: raw.message.clone(),
        reason: raw.reason.clone(),
        action: raw.action.clone(),
        name: raw.name.clone(),
        kind: raw.kind.clone(),
        related_name: related.map(|r| r.name.clone()).unwrap_or_default(),
        related_kind: related.map(|r| r.kind.clone()).unwrap_or_default(),
        related_namespace: related.map(|r| r.namespace.clone()).unwrap_or_default(),
        involved_object_namespace: raw.involved_object.namespace.clone(),
        involved_object_kind: raw.involved_object.kind.clone(),
        involved_object_name: raw.involved_object.name.clone(),
        event_time,
        count: raw.count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_collector_shared::ObjectRef;

    fn sample_raw() -> RawEvent {
        RawEvent {
            name: "e1".to_string(),
            namespace: "argocd".to_string(),
            count: 3,
            reason: "BackOff".to_string(),
            message: "Back-off restarting failed container".to_string(),
            event_type: "Warning".to_string(),
            action: "Binding".to_string(),
            kind: "Event".to_string(),
            involved_object: ObjectRef {
                namespace: "argocd".to_string(),
                kind: "Pod".to_string(),
                name: "argocd-repo-server-xyz".to_string(),
            },
            related_object: None,
            last_timestamp: Some("2024-04-12T03:17:16Z".to_string()),
        }
    }

    #[test]
    fn test_to_document_maps_all_fields() {
        let doc = to_document(&sample_raw());

        assert_eq!(doc.event_type, "Warning");
        assert_eq!(doc.reason, "BackOff");
        assert_eq!(doc.name, "e1");
        assert_eq!(doc.count, 3);
        assert_eq!(doc.involved_object_namespace, "argocd");
        assert_eq!(doc.involved_object_kind, "Pod");
        assert_eq!(doc.involved_object_name, "argocd-repo-server-xyz");
        assert_eq!(
            doc.event_time.unwrap().to_rfc3339(),
            "2024-04-12T03:17:16+00:00"
        );
        assert_eq!(doc.related_name, "");
    }

    #[test]
    fn test_to_document_drops_bad_timestamp() {
        let mut raw = sample_raw();
        raw.last_timestamp = Some("yesterday-ish".to_string());

        let doc = to_document(&raw);
        assert!(doc.event_time.is_none());
        assert_eq!(doc.reason, "BackOff");
    }

    #[test]
    fn test_to_document_without_timestamp() {
        let mut raw = sample_raw();
        raw.last_timestamp = None;

        assert!(to_document(&raw).event_time.is_none());
    }

    #[test]
    fn test_to_document_flattens_related_object() {
        let mut raw = sample_raw();
        raw.related_object = Some(ObjectRef {
            namespace: "argocd".to_string(),
            kind: "Deployment".to_string(),
            name: "argocd-repo-server".to_string(),
        });

        let doc = to_document(&raw);
        assert_eq!(doc.related_namespace, "argocd");
        assert_eq!(doc.related_kind, "Deployment");
        assert_eq!(doc.related_name, "argocd-repo-server");
    }
}
