//! # Event Collector Shared
//!
//! Shared types and data structures for the event collector system.
//!
//! These types cross crate boundaries: the pipeline produces
//! [`EventDocument`]s from [`RawEvent`] snapshots keyed by [`ResourceKey`],
//! and the repository returns [`EventSearchResults`] to the query service.

mod document;
mod key;
mod raw_event;

pub use document::{EventDocument, EventSearchResults};
pub use key::{KeyParseError, ResourceKey};
pub use raw_event::{ObjectRef, RawEvent};
