//! Query service over the shared document store client.

use std::sync::Arc;

use metrics::counter;
use tracing::debug;

use crate::errors::QueryError;
use event_collector_repository::EventStore;
use event_collector_shared::EventSearchResults;

/// Serves lookups of indexed events by involved object.
///
/// Holds the long-lived store client; one instance is shared across all
/// requests.
pub struct QueryService {
    store: Arc<dyn EventStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Fetch all indexed events involving the given object.
    pub async fn get_resource_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<EventSearchResults, QueryError> {
        if namespace.is_empty() {
            return Err(QueryError::invalid_request("Namespace must not be empty"));
        }
        if kind.is_empty() {
            return Err(QueryError::invalid_request("Kind must not be empty"));
        }
        if name.is_empty() {
            return Err(QueryError::invalid_request("Name must not be empty"));
        }

        let results = self.store.search_events(namespace, kind, name).await?;
        debug!(
            namespace,
            kind,
            name,
            total = results.total,
            "Served event query"
        );
        counter!(
            "k8s_event_search_event_server_total",
            "eventNamespace" => namespace.to_string()
        )
        .increment(1);
        Ok(results)
    }
}
