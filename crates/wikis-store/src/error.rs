//! Index store error types.

use thiserror::Error;

/// Store error `type` returned when creating an index that already exists.
pub const ALREADY_EXISTS_TYPE: &str = "resource_already_exists_exception";

/// Store error `type` returned for failed restores.
pub const RESTORE_EXCEPTION_TYPE: &str = "snapshot_restore_exception";

/// Reason text the store uses when a restore target index is already open.
///
/// Older store versions only signal the conflict through this text.
pub const OPEN_INDEX_CONFLICT_REASON: &str = "an open index with same name already exists";

/// Errors that can occur when talking to the index store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach the store or read its response
    #[error("Transport error: {0}")]
    Transport(String),

    /// Index creation hit an existing index
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// Restore hit an open index with the same name
    #[error("Restore conflict: {0}")]
    RestoreConflict(String),

    /// Any other error reported by the store
    #[error("Store returned HTTP {status} ({error_type}): {reason}")]
    Api {
        status: u16,
        error_type: String,
        reason: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Snapshot reached a failed terminal state
    #[error("Snapshot {snapshot} finished in state {state}")]
    SnapshotFailed { snapshot: String, state: String },

    /// Snapshot did not complete before the deadline
    #[error("Timed out after {elapsed_secs}s waiting for snapshot {snapshot}")]
    SnapshotTimeout { snapshot: String, elapsed_secs: u64 },

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// True for the benign restore conflict.
    pub fn is_restore_conflict(&self) -> bool {
        matches!(self, StoreError::RestoreConflict(_))
    }

    /// True when index creation found an existing index.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::IndexAlreadyExists(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Classify an error response from the store.
///
/// Structured `error.type` wins; the reason substring is checked as well so
/// stores that only report a generic exception type still classify.
pub fn classify_error(status: u16, error_type: &str, reason: &str) -> StoreError {
    if error_type == ALREADY_EXISTS_TYPE {
        return StoreError::IndexAlreadyExists(reason.to_string());
    }
    if reason.contains(OPEN_INDEX_CONFLICT_REASON) {
        return StoreError::RestoreConflict(reason.to_string());
    }
    StoreError::Api {
        status,
        error_type: error_type.to_string(),
        reason: reason.to_string(),
    }
}
