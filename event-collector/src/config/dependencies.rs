//! Dependency initialization and wiring for the event collector.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use k8s_openapi::api::core::v1::Event;
use kube::runtime::reflector;
use kube::runtime::reflector::store::Writer;
use kube::runtime::reflector::Store;
use tracing::info;

use crate::CollectorError;
use event_collector_pipeline::cache::KubeEventCache;
use event_collector_pipeline::collector::{CollectorConfig, EventCollector};
use event_collector_pipeline::queue::RateLimitedQueue;
use event_collector_repository::opensearch::todays_index_name;
use event_collector_repository::{EventStore, OpenSearchEventStore, StoreConfig};
use event_collector_query::QueryService;
use event_collector_shared::ResourceKey;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default listen address for the HTTP API.
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Cluster API client for the change feed.
    pub kube_client: kube::Client,
    /// Writer half of the local cache the change feed maintains.
    pub feed_writer: Writer<Event>,
    /// Reader half of the local cache, used to await the initial sync.
    pub feed_reader: Store<Event>,
    /// The shared key queue between the feed and the sync engine.
    pub queue: RateLimitedQueue<ResourceKey>,
    /// The configured sync engine ready to run.
    pub collector: EventCollector,
    /// The read-path service backed by the same store client.
    pub query_service: Arc<QueryService>,
    /// Listen address for the HTTP API.
    pub http_addr: SocketAddr,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL(s), comma separated
    ///   (default: http://localhost:9200)
    /// - `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`: optional basic auth
    /// - `COLLECTOR_WORKERS`: number of sync workers (default: 5)
    /// - `HTTP_ADDR`: listen address for the HTTP API (default: 0.0.0.0:8080)
    ///
    /// The index template and retention policy are installed here, before
    /// any worker starts; failure is fatal.
    pub async fn new() -> Result<Self, CollectorError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let username = env::var("OPENSEARCH_USERNAME").ok();
        let password = env::var("OPENSEARCH_PASSWORD").ok();
        let workers = match env::var("COLLECTOR_WORKERS") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| CollectorError::config("COLLECTOR_WORKERS must be a number"))?,
            Err(_) => CollectorConfig::default().workers,
        };
        let http_addr: SocketAddr = env::var("HTTP_ADDR")
            .unwrap_or_else(|_| DEFAULT_HTTP_ADDR.to_string())
            .parse()
            .map_err(|_| CollectorError::config("HTTP_ADDR must be a socket address"))?;

        info!(
            opensearch_url = %opensearch_url,
            workers,
            http_addr = %http_addr,
            "Initializing dependencies"
        );

        let store_config = StoreConfig {
            endpoints: opensearch_url
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            username,
            password,
        };
        let store = OpenSearchEventStore::new(&store_config).map_err(|e| {
            CollectorError::config(format!("Failed to create OpenSearch client: {}", e))
        })?;

        let healthy = store.health_check().await.map_err(|e| {
            CollectorError::config(format!("OpenSearch health check failed: {}", e))
        })?;
        if !healthy {
            return Err(CollectorError::config("OpenSearch cluster is unhealthy"));
        }
        info!("OpenSearch connection verified");

        store.ensure_index_template().await?;
        store.ensure_lifecycle_policy().await?;
        info!("Index template and retention policy installed");

        let kube_client = kube::Client::try_default().await.map_err(|e| {
            CollectorError::config(format!("Failed to create cluster client: {}", e))
        })?;
        info!("Cluster client created");

        let (feed_reader, feed_writer) = reflector::store::<Event>();
        let cache = Arc::new(KubeEventCache::new(feed_reader.clone()));
        let queue = RateLimitedQueue::new();

        let store: Arc<dyn EventStore> = Arc::new(store);
        let collector = EventCollector::new(
            queue.clone(),
            cache,
            Arc::clone(&store),
            todays_index_name(),
            CollectorConfig { workers },
        );
        let query_service = Arc::new(QueryService::new(store));

        Ok(Self {
            kube_client,
            feed_writer,
            feed_reader,
            queue,
            collector,
            query_service,
            http_addr,
        })
    }
}
