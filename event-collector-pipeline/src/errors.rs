//! Error types for the ingestion pipeline.

use thiserror::Error;

use event_collector_repository::StoreError;

/// Errors that can occur in the ingestion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The change-feed watch failed.
    #[error("Watch error: {0}")]
    WatchError(String),

    /// Reading a snapshot from the feed's local cache failed.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// A document store operation failed.
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
}

impl PipelineError {
    /// Create a watch error.
    pub fn watch(msg: impl Into<String>) -> Self {
        Self::WatchError(msg.into())
    }

    /// Create a cache error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::CacheError(msg.into())
    }
}
