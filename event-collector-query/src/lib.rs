//! Read path for collected cluster events.
//!
//! Serves lookups of indexed events by the object they involve, over a
//! small HTTP API backed by the shared document store client.

pub mod errors;
pub mod routes;
pub mod service;

pub use errors::QueryError;
pub use service::QueryService;
