//! Error types for the bootstrap and ingest pipeline.

use thiserror::Error;
use wikis_scrape::ScrapeError;
use wikis_store::StoreError;
use wikis_types::WikisError;

/// Errors that can occur while bootstrapping the index
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Index store operation failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fetching or parsing upstream pages failed
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// A scraped document failed validation
    #[error("Document error: {0}")]
    Document(#[from] WikisError),

    /// Marker directory could not be read
    #[error("Marker directory error: {0}")]
    Marker(String),

    /// Checkpoint load/save issues
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BootstrapError {
    fn from(err: serde_json::Error) -> Self {
        BootstrapError::Serialization(err.to_string())
    }
}
