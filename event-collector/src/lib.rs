//! # Event Collector
//!
//! Main library for the cluster event collector.
//!
//! This crate provides the entry point and configuration for running
//! the collection pipeline and the read path.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during collector initialization or execution.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] event_collector_pipeline::PipelineError),

    /// Store error.
    #[error("Store error: {0}")]
    StoreError(#[from] event_collector_repository::StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CollectorError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
