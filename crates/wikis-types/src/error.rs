//! Error types shared across the wikis crates.

use thiserror::Error;

/// Unified error type for domain and configuration failures.
#[derive(Debug, Error)]
pub enum WikisError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document violated one of its invariants
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
