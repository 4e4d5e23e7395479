//! Error types for the event collector repository.

mod store_error;

pub use store_error::StoreError;
