//! # wikis-types
//!
//! Shared domain types for the wikis loader:
//! - Documents: ranked articles and the ten category lists they come from
//! - Snapshot state: completion of index-store snapshots
//! - Settings: layered configuration

pub mod config;
pub mod document;
pub mod error;
pub mod snapshot;

pub use config::Settings;
pub use document::{document_id, Category, Document, RankedEntry};
pub use error::WikisError;
pub use snapshot::{SnapshotCompletion, SnapshotState};
