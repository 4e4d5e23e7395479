//! # Event Collector Repository
//!
//! This crate provides traits and implementations for interacting with the
//! document store. It includes definitions for errors, interfaces, and a
//! concrete implementation for OpenSearch, including the index naming and
//! lifecycle policy the ingestion pipeline depends on.

pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use errors::StoreError;
pub use interfaces::EventStore;
pub use opensearch::{OpenSearchEventStore, StoreConfig};
