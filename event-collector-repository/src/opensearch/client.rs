//! OpenSearch event store implementation.
//!
//! This module provides the concrete implementation of `EventStore` using
//! the OpenSearch Rust client. All setup calls are check-then-create so the
//! process can be restarted without error.

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::{
        headers::HeaderMap,
        request::JsonBody,
        transport::{SingleNodeConnectionPool, TransportBuilder},
        Method, StatusCode,
    },
    indices::{
        IndicesCreateParts, IndicesExistsParts, IndicesExistsTemplateParts,
        IndicesPutTemplateParts,
    },
    IndexParts, OpenSearch, SearchParts,
};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::StoreError;
use crate::interfaces::EventStore;
use crate::opensearch::index_config::{
    index_settings, index_template, lifecycle_policy, INDEX_PATTERN, LIFECYCLE_POLICY_NAME,
    TEMPLATE_NAME,
};
use crate::opensearch::queries::build_resource_events_query;
use event_collector_shared::{EventDocument, EventSearchResults};

/// Connection settings for the store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Store endpoints. The client connects to the first one.
    pub endpoints: Vec<String>,
    /// Basic auth username, if the store requires credentials.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

/// OpenSearch event store.
///
/// One instance is constructed at startup and shared read-only between the
/// sync engine workers and the query service; the underlying transport pools
/// connections, so no further synchronization is needed.
pub struct OpenSearchEventStore {
    client: OpenSearch,
}

impl OpenSearchEventStore {
    /// Create a new store client from connection settings.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let endpoint = config
            .endpoints
            .first()
            .ok_or_else(|| StoreError::connection("no store endpoint configured"))?;
        let url = Url::parse(endpoint).map_err(|e| StoreError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        info!(endpoint = %endpoint, "Created OpenSearch client");

        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// Decode one search hit into an [`EventDocument`].
    ///
    /// A hit with a missing or mistyped field yields a decode error for that
    /// record, never a panic.
    fn parse_hit(hit: &Value) -> Result<EventDocument, StoreError> {
        let source = hit
            .get("_source")
            .ok_or_else(|| StoreError::decode("hit missing _source"))?;
        serde_json::from_value(source.clone())
            .map_err(|e| StoreError::decode(format!("malformed hit: {}", e)))
    }

    /// Extract the total hit count from a search response body.
    ///
    /// The store reports the total as an object with a numeric `value` field
    /// when `track_total_hits` is set; older responses may carry a bare
    /// integer. Anything else is a decode error.
    fn parse_total(body: &Value) -> Result<u64, StoreError> {
        let total = &body["hits"]["total"];
        total
            .as_u64()
            .or_else(|| total["value"].as_u64())
            .ok_or_else(|| StoreError::decode("missing hits.total.value in search response"))
    }
}

#[async_trait]
impl EventStore for OpenSearchEventStore {
    async fn ensure_index_template(&self) -> Result<(), StoreError> {
        let exists = self
            .client
            .indices()
            .exists_template(IndicesExistsTemplateParts::Name(&[TEMPLATE_NAME]))
            .send()
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if exists.status_code() == StatusCode::OK {
            debug!(template = TEMPLATE_NAME, "Index template already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .put_template(IndicesPutTemplateParts::Name(TEMPLATE_NAME))
            .body(index_template())
            .send()
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::setup(format!(
                "failed to create index template: {}",
                body
            )));
        }

        info!(template = TEMPLATE_NAME, "Index template created");
        Ok(())
    }

    async fn ensure_lifecycle_policy(&self) -> Result<(), StoreError> {
        let policy_path = format!("/_plugins/_ism/policies/{}", LIFECYCLE_POLICY_NAME);

        let existing = self
            .client
            .transport()
            .send(
                Method::Get,
                &policy_path,
                HeaderMap::new(),
                None::<&()>,
                None::<JsonBody<Value>>,
                None,
            )
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if existing.status_code() == StatusCode::OK {
            debug!(policy = LIFECYCLE_POLICY_NAME, "Lifecycle policy already exists");
            return Ok(());
        }

        let response = self
            .client
            .transport()
            .send(
                Method::Put,
                &policy_path,
                HeaderMap::new(),
                None::<&()>,
                Some(JsonBody::new(lifecycle_policy())),
                None,
            )
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::setup(format!(
                "failed to create lifecycle policy: {}",
                body
            )));
        }

        info!(policy = LIFECYCLE_POLICY_NAME, "Lifecycle policy created");
        Ok(())
    }

    async fn ensure_index(&self, name: &str) -> Result<(), StoreError> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if exists.status_code() == StatusCode::OK {
            info!(index = %name, "Index already exists, skipping creation");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(index_settings())
            .send()
            .await
            .map_err(|e| StoreError::setup(e.to_string()))?;

        if !response.status_code().is_success() {
            let body = response.text().await.unwrap_or_default();
            // Lost a creation race with another replica; the index is there.
            if body.contains("resource_already_exists_exception") {
                debug!(index = %name, "Index was created concurrently");
                return Ok(());
            }
            return Err(StoreError::setup(format!(
                "failed to create index {}: {}",
                name, body
            )));
        }

        info!(index = %name, "Index created");
        Ok(())
    }

    async fn write_event(&self, doc: &EventDocument, index: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .index(IndexParts::Index(index))
            .body(doc)
            .send()
            .await
            .map_err(|e| StoreError::write(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::write(format!(
                "index request failed with status {}: {}",
                status, body
            )));
        }

        debug!(
            index = %index,
            name = %doc.name,
            reason = %doc.reason,
            "Event document indexed"
        );
        Ok(())
    }

    async fn search_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<EventSearchResults, StoreError> {
        let response = self
            .client
            .search(SearchParts::Index(&[INDEX_PATTERN]))
            .body(build_resource_events_query(namespace, kind, name))
            .send()
            .await
            .map_err(|e| StoreError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::search(format!(
                "search failed with status {}: {}",
                status, body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::decode(e.to_string()))?;

        let total = Self::parse_total(&body)?;

        let mut events = Vec::new();
        if let Some(hits) = body["hits"]["hits"].as_array() {
            for hit in hits {
                match Self::parse_hit(hit) {
                    Ok(doc) => events.push(doc),
                    Err(e) => {
                        // Report and skip the bad record instead of failing
                        // the whole request.
                        warn!(error = %e, "Skipping malformed search hit");
                    }
                }
            }
        }

        debug!(
            namespace = %namespace,
            kind = %kind,
            name = %name,
            total = total,
            decoded = events.len(),
            "Search completed"
        );

        Ok(EventSearchResults { events, total })
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;
        Ok(response.status_code().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hit() {
        let hit = json!({
            "_index": "k8s-event-collector-2024-04-12",
            "_id": "OVRP0I4BQhn09EwbOZFb",
            "_source": {
                "Type": "Normal",
                "Message": "Stopping container server",
                "Reason": "Killing",
                "Action": "",
                "Name": "argocd-server-abc.17c56a0c",
                "Kind": "",
                "RelatedName": "",
                "RelatedKind": "",
                "RelatedNamespace": "",
                "InvolvedObjectNamespace": "argocd",
                "InvolvedObjectKind": "Pod",
                "InvolvedObjectName": "argocd-server-abc",
                "EventTime": "2024-04-12T03:17:16Z",
                "Count": 1
            }
        });

        let doc = OpenSearchEventStore::parse_hit(&hit).unwrap();
        assert_eq!(doc.reason, "Killing");
        assert_eq!(doc.involved_object_namespace, "argocd");
        assert_eq!(doc.count, 1);
    }

    #[test]
    fn test_parse_hit_wrong_field_type_is_recoverable_error() {
        let hit = json!({
            "_source": {
                "Type": "Normal",
                "Message": "m",
                "Reason": "r",
                "Action": "",
                "Name": "n",
                "Kind": "",
                "InvolvedObjectNamespace": "ns",
                "InvolvedObjectKind": "Pod",
                "InvolvedObjectName": "p",
                "Count": "not-a-number"
            }
        });

        let result = OpenSearchEventStore::parse_hit(&hit);
        assert!(matches!(result, Err(StoreError::DecodeError(_))));
    }

    #[test]
    fn test_parse_hit_missing_source() {
        let hit = json!({ "_id": "abc" });
        assert!(OpenSearchEventStore::parse_hit(&hit).is_err());
    }

    #[test]
    fn test_parse_total_object_form() {
        let body = json!({ "hits": { "total": { "value": 42, "relation": "eq" } } });
        assert_eq!(OpenSearchEventStore::parse_total(&body).unwrap(), 42);
    }

    #[test]
    fn test_parse_total_bare_integer() {
        let body = json!({ "hits": { "total": 7 } });
        assert_eq!(OpenSearchEventStore::parse_total(&body).unwrap(), 7);
    }

    #[test]
    fn test_parse_total_missing_is_error() {
        let body = json!({ "hits": {} });
        assert!(OpenSearchEventStore::parse_total(&body).is_err());
    }
}
