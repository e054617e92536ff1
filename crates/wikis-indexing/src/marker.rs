//! Marker directory probe.
//!
//! The snapshot repository directory doubles as the "ingest already done"
//! signal: any file in it other than the housekeeping file means a snapshot
//! was taken on a previous run.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::BootstrapError;

#[derive(Debug, Clone)]
pub struct MarkerDir {
    path: PathBuf,
    housekeeping_file: String,
}

impl MarkerDir {
    pub fn new(path: impl Into<PathBuf>, housekeeping_file: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            housekeeping_file: housekeeping_file.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in the directory, excluding the housekeeping file, sorted by
    /// name. A missing directory has no artifacts.
    pub fn artifacts(&self) -> Result<Vec<PathBuf>, BootstrapError> {
        let entries = match std::fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.error(e)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.error(e))?;
            if entry.file_name().to_string_lossy() == self.housekeeping_file {
                continue;
            }
            artifacts.push(entry.path());
        }
        artifacts.sort();
        Ok(artifacts)
    }

    pub fn has_artifacts(&self) -> Result<bool, BootstrapError> {
        Ok(!self.artifacts()?.is_empty())
    }

    fn error(&self, e: io::Error) -> BootstrapError {
        BootstrapError::Marker(format!("{}: {}", self.path.display(), e))
    }
}
