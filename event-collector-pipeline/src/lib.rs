//! # Event Collector Pipeline
//!
//! This crate provides the ingestion pipeline that turns the cluster's
//! at-least-once event stream into deduplicated, rate-limited writes to the
//! document store.
//!
//! ## Architecture
//!
//! 1. **Watch**: a kube watcher feeds a reflector cache and enqueues
//!    resource keys
//! 2. **Queue**: a rate-limited work queue collapses bursts per key
//! 3. **Collector**: a fixed worker pool reads snapshots from the cache,
//!    transforms them, and writes documents to the store with
//!    retry-on-failure

pub mod cache;
pub mod collector;
pub mod errors;
pub mod processor;
pub mod queue;
pub mod watch;

pub use errors::PipelineError;
