//! Event store trait definition.
//!
//! This module defines the abstract interface for the document store,
//! allowing different backend implementations (OpenSearch, mock, etc.).

use async_trait::async_trait;

use crate::errors::StoreError;
use event_collector_shared::{EventDocument, EventSearchResults};

/// Abstract interface for the event document store.
///
/// The sync engine writes through this trait and the query service reads
/// through it; both hold a shared long-lived instance injected at startup.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Register the index template for the event document shape.
    ///
    /// Idempotent; called once at startup before any index exists. Failure
    /// is fatal for the process.
    async fn ensure_index_template(&self) -> Result<(), StoreError>;

    /// Register the index lifecycle policy (hot rollover, delete retention).
    ///
    /// Idempotent; called once at startup. Failure is fatal for the process.
    async fn ensure_lifecycle_policy(&self) -> Result<(), StoreError>;

    /// Create the named index if it does not exist, bound to the lifecycle
    /// policy via the rollover alias.
    ///
    /// Calling this twice for the same name never errors and never creates
    /// a duplicate.
    async fn ensure_index(&self, name: &str) -> Result<(), StoreError>;

    /// Index a single event document into the named index.
    ///
    /// Any transport or store-side failure surfaces as a retryable
    /// [`StoreError::WriteError`].
    async fn write_event(&self, doc: &EventDocument, index: &str) -> Result<(), StoreError>;

    /// Search for events whose involved object exactly matches all three of
    /// namespace, kind, and name, across all dated index partitions.
    async fn search_events(
        &self,
        namespace: &str,
        kind: &str,
        name: &str,
    ) -> Result<EventSearchResults, StoreError>;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> Result<bool, StoreError>;
}
