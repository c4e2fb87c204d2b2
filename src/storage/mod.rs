//! Storage module for persisting crawl results
//!
//! The crawl's only output is the result set, written once at the end of a run
//! through a [`MetadataStore`]. [`JsonFileStore`] is the production store.

mod json;
mod traits;

pub use json::JsonFileStore;
pub use traits::{MetadataStore, PersistError, PersistResult};

use crate::config::Config;

/// Opens the store configured in `[output]`
pub fn open_store(config: &Config) -> JsonFileStore {
    JsonFileStore::new(&config.output.metadata_path)
}
