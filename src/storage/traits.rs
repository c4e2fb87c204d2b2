//! Storage traits and error types
//!
//! This module defines the trait interface for metadata stores and the error
//! returned when the final write fails.

use crate::state::TokenMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting the result set
///
/// Persisting happens once, at the end of a crawl, so every variant is fatal.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to serialize metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for storage operations
pub type PersistResult<T> = Result<T, PersistError>;

/// Destination of the crawl's result set
///
/// `save` is called exactly once per crawl run, after every detail visit has
/// reached a terminal outcome.
pub trait MetadataStore: Send {
    /// Writes the complete result set, replacing any previous document
    fn save(&mut self, tokens: &TokenMap) -> PersistResult<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}
