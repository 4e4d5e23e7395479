//! OpenSearch implementation of the event store.
//!
//! This module provides a concrete implementation of `EventStore` using
//! OpenSearch as the backend, plus the index naming and lifecycle constants
//! the rest of the system depends on.

mod client;
mod index_config;
mod queries;

pub use client::{OpenSearchEventStore, StoreConfig};
pub use index_config::{
    index_name_for, todays_index_name, INDEX_BASE, INDEX_PATTERN, LIFECYCLE_POLICY_NAME,
    TEMPLATE_NAME,
};
pub use queries::build_resource_events_query;
