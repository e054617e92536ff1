//! Ingest checkpoint for resuming an interrupted load.
//!
//! Records which documents have been written to the index. The file lives in
//! the state directory and is removed once the snapshot succeeds.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BootstrapError;

/// File name of the checkpoint inside the state directory.
pub const CHECKPOINT_FILE: &str = "ingest_checkpoint.json";

/// Progress of a full ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCheckpoint {
    /// Index the documents were written to
    pub index_name: String,

    /// Ids of documents already written
    pub completed: BTreeSet<String>,

    /// Total documents written since the checkpoint was created
    pub processed_count: u64,

    /// Timestamp of last write (milliseconds since epoch for JSON compatibility)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_processed_time: DateTime<Utc>,

    /// When the ingest started (milliseconds since epoch)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl IngestCheckpoint {
    /// Create an empty checkpoint for `index_name`
    pub fn new(index_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            index_name: index_name.into(),
            completed: BTreeSet::new(),
            processed_count: 0,
            last_processed_time: now,
            created_at: now,
        }
    }

    pub fn is_completed(&self, doc_id: &str) -> bool {
        self.completed.contains(doc_id)
    }

    /// Record a written document
    pub fn record(&mut self, doc_id: impl Into<String>) {
        if self.completed.insert(doc_id.into()) {
            self.processed_count += 1;
        }
        self.last_processed_time = Utc::now();
    }

    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, BootstrapError> {
        serde_json::to_vec(self).map_err(BootstrapError::from)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BootstrapError> {
        serde_json::from_slice(bytes).map_err(BootstrapError::from)
    }

    /// Load the checkpoint for `index_name` from `path`.
    ///
    /// Returns None when there is no file or it belongs to another index.
    /// An unreadable file is an error rather than a silent fresh start.
    pub fn load(path: &Path, index_name: &str) -> Result<Option<Self>, BootstrapError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BootstrapError::Checkpoint(format!(
                    "read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let checkpoint = Self::from_bytes(&bytes)?;
        if checkpoint.index_name != index_name {
            warn!(
                path = %path.display(),
                found = %checkpoint.index_name,
                expected = index_name,
                "Ignoring checkpoint for another index"
            );
            return Ok(None);
        }
        Ok(Some(checkpoint))
    }

    /// Write to `path` via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), BootstrapError> {
        let io_err =
            |e: io::Error| BootstrapError::Checkpoint(format!("write {}: {}", path.display(), e));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, self.to_bytes()?).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;
        debug!(path = %path.display(), processed = self.processed_count, "Saved checkpoint");
        Ok(())
    }

    /// Delete the checkpoint at `path` if present.
    pub fn clear(path: &Path) -> Result<(), BootstrapError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BootstrapError::Checkpoint(format!(
                "remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
