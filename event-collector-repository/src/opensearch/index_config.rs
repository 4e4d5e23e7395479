//! Index naming, mappings, and lifecycle policy for the event store.
//!
//! One index is created per UTC date. The lifecycle policy rolls an index
//! over after one day of age and deletes it after three days; both are
//! policy constants, not configuration.

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

/// Base name shared by all dated event indices and the rollover alias.
pub const INDEX_BASE: &str = "k8s-event-collector";

/// Wildcard pattern spanning all dated partitions, used by the read path.
pub const INDEX_PATTERN: &str = "k8s-event-collector-*";

/// Name of the index template carrying the document field mapping.
pub const TEMPLATE_NAME: &str = "k8s-event-collector";

/// Name of the index lifecycle policy.
pub const LIFECYCLE_POLICY_NAME: &str = "k8s-event-collector-retention";

/// Age at which the hot phase rolls the index over.
const ROLLOVER_MAX_AGE: &str = "1d";

/// Age at which an index is deleted.
const DELETE_MIN_AGE: &str = "3d";

/// Index name for a given UTC date, `<base>-<YYYY-MM-DD>`.
pub fn index_name_for(date: NaiveDate) -> String {
    format!("{}-{}", INDEX_BASE, date.format("%Y-%m-%d"))
}

/// Index name for the current UTC date. Computed once per process lifetime
/// at startup by the wiring, not re-evaluated per write.
pub fn todays_index_name() -> String {
    index_name_for(Utc::now().date_naive())
}

/// Field mapping for the event document shape.
///
/// Tags and identifiers are `keyword` so the read path can filter on exact
/// values; only the free-text message is analyzed.
pub fn index_template() -> Value {
    json!({
        "index_patterns": [INDEX_PATTERN],
        "mappings": {
            "properties": {
                "Type": { "type": "keyword" },
                "Message": { "type": "text" },
                "Reason": { "type": "keyword" },
                "Action": { "type": "keyword" },
                "Name": { "type": "keyword" },
                "Kind": { "type": "keyword" },
                "RelatedName": { "type": "keyword" },
                "RelatedKind": { "type": "keyword" },
                "RelatedNamespace": { "type": "keyword" },
                "InvolvedObjectNamespace": { "type": "keyword" },
                "InvolvedObjectKind": { "type": "keyword" },
                "InvolvedObjectName": { "type": "keyword" },
                "EventTime": { "type": "date" },
                "Count": { "type": "long" }
            }
        }
    })
}

/// Lifecycle policy body: hot phase rolls over at [`ROLLOVER_MAX_AGE`],
/// indices transition to the delete state and are removed at
/// [`DELETE_MIN_AGE`].
pub fn lifecycle_policy() -> Value {
    json!({
        "policy": {
            "description": "Roll event indices daily and expire them after the retention window",
            "default_state": "hot",
            "states": [
                {
                    "name": "hot",
                    "actions": [
                        { "rollover": { "min_index_age": ROLLOVER_MAX_AGE } }
                    ],
                    "transitions": [
                        {
                            "state_name": "delete",
                            "conditions": { "min_index_age": DELETE_MIN_AGE }
                        }
                    ]
                },
                {
                    "name": "delete",
                    "actions": [ { "delete": {} } ],
                    "transitions": []
                }
            ],
            "ism_template": [
                { "index_patterns": [INDEX_PATTERN], "priority": 0 }
            ]
        }
    })
}

/// Settings for a newly created dated index: binds the lifecycle policy via
/// the rollover alias.
pub fn index_settings() -> Value {
    json!({
        "settings": {
            "plugins.index_state_management.rollover_alias": INDEX_BASE
        },
        "aliases": {
            INDEX_BASE: {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_name_for_date() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 12).unwrap();
        assert_eq!(index_name_for(date), "k8s-event-collector-2024-04-12");
    }

    #[test]
    fn test_todays_index_name_matches_pattern() {
        let name = todays_index_name();
        assert!(name.starts_with("k8s-event-collector-"));
        // base + dash + YYYY-MM-DD
        assert_eq!(name.len(), INDEX_BASE.len() + 11);
    }

    #[test]
    fn test_template_field_types() {
        let template = index_template();
        let props = &template["mappings"]["properties"];

        assert_eq!(props["Message"]["type"], "text");
        assert_eq!(props["Reason"]["type"], "keyword");
        assert_eq!(props["InvolvedObjectNamespace"]["type"], "keyword");
        assert_eq!(props["InvolvedObjectKind"]["type"], "keyword");
        assert_eq!(props["InvolvedObjectName"]["type"], "keyword");
        assert_eq!(props["EventTime"]["type"], "date");
        assert_eq!(props["Count"]["type"], "long");
        assert_eq!(template["index_patterns"][0], INDEX_PATTERN);
    }

    #[test]
    fn test_lifecycle_policy_phases() {
        let policy = lifecycle_policy();
        let states = policy["policy"]["states"].as_array().unwrap();
        assert_eq!(states.len(), 2);

        assert_eq!(states[0]["name"], "hot");
        assert_eq!(
            states[0]["actions"][0]["rollover"]["min_index_age"],
            "1d"
        );
        assert_eq!(
            states[0]["transitions"][0]["conditions"]["min_index_age"],
            "3d"
        );
        assert_eq!(states[1]["name"], "delete");
        assert!(states[1]["actions"][0]["delete"].is_object());
    }

    #[test]
    fn test_index_settings_bind_rollover_alias() {
        let settings = index_settings();
        assert_eq!(
            settings["settings"]["plugins.index_state_management.rollover_alias"],
            INDEX_BASE
        );
        assert!(settings["aliases"][INDEX_BASE].is_object());
    }
}
