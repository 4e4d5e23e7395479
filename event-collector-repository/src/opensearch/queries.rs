//! OpenSearch query builders for the event read path.

use serde_json::{json, Value};

/// Build the point query for "all events concerning one resource".
///
/// An AND of three exact-match `term` filters on the involved object's
/// namespace, kind, and name. The mapped fields are `keyword` typed, so no
/// partial or fuzzy matches can leak through. `track_total_hits` is set so
/// the store reports the full hit count as an object with a `value` field.
pub fn build_resource_events_query(namespace: &str, kind: &str, name: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": [
                    { "term": { "InvolvedObjectNamespace": namespace } },
                    { "term": { "InvolvedObjectKind": kind } },
                    { "term": { "InvolvedObjectName": name } }
                ]
            }
        },
        "track_total_hits": true
    })
}
