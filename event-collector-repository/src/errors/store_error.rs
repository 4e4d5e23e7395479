//! Document store error types.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Failed to establish or use a connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Startup-time registration (index template, lifecycle policy, index
    /// creation) failed. The process must not accept work after this.
    #[error("Setup error: {0}")]
    SetupError(String),

    /// A single-document write failed. Treated as transient and retryable
    /// by the sync engine.
    #[error("Write error: {0}")]
    WriteError(String),

    /// A search request failed.
    #[error("Search error: {0}")]
    SearchError(String),

    /// A search response or hit did not have the expected shape.
    #[error("Decode error: {0}")]
    DecodeError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a setup error.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::SetupError(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::WriteError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }
}
