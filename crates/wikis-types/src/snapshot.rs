//! Snapshot lifecycle state as reported by the index store.

use serde::{Deserialize, Serialize};

/// Completion state of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotCompletion {
    /// Started (or queued) but not finished
    Pending,
    /// All shards written
    Success,
    /// Failed, aborted or only partially written
    Failed,
}

impl SnapshotCompletion {
    /// Map a store-reported state string.
    ///
    /// Anything the store reports that is neither success nor a known
    /// failure counts as still running.
    pub fn from_store_state(state: &str) -> Self {
        match state {
            "SUCCESS" => SnapshotCompletion::Success,
            "FAILED" | "PARTIAL" | "ABORTED" => SnapshotCompletion::Failed,
            _ => SnapshotCompletion::Pending,
        }
    }
}

impl std::fmt::Display for SnapshotCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotCompletion::Pending => write!(f, "PENDING"),
            SnapshotCompletion::Success => write!(f, "SUCCESS"),
            SnapshotCompletion::Failed => write!(f, "FAILED"),
        }
    }
}

/// Whether a snapshot exists and how far along it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotState {
    pub exists: bool,
    pub completion: SnapshotCompletion,
}

impl SnapshotState {
    /// State for a snapshot the store does not know about.
    pub fn missing() -> Self {
        Self {
            exists: false,
            completion: SnapshotCompletion::Pending,
        }
    }

    pub fn reported(completion: SnapshotCompletion) -> Self {
        Self {
            exists: true,
            completion,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.exists && self.completion == SnapshotCompletion::Success
    }
}
