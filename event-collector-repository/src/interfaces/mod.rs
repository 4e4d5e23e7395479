//! Interface definitions for the document store client.
//!
//! This module defines the abstract `EventStore` trait that allows for
//! dependency injection and swappable store implementations in tests.

mod event_store;

pub use event_store::EventStore;
