//! Index bootstrap for the wikis loader.
//!
//! On every start the [`BootstrapController`] either restores the index from
//! a filesystem snapshot or builds it from scratch and snapshots it.
//!
//! ## Key Components
//!
//! - [`BootstrapController`]: restore-or-ingest decision and phase logging
//! - [`IngestPipeline`]: ranking page to indexed documents
//! - [`IngestCheckpoint`]: completed-document set for resuming a crashed ingest
//! - [`MarkerDir`]: snapshot artifact probe
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wikis_indexing::{BootstrapConfig, BootstrapController};
//!
//! let controller = BootstrapController::new(store, source, BootstrapConfig::from_settings(&settings));
//! let outcome = controller.ensure_index_ready().await?;
//! ```

pub mod bootstrap;
pub mod checkpoint;
pub mod error;
pub mod ingest;
pub mod marker;

pub use bootstrap::{BootstrapConfig, BootstrapController, BootstrapOutcome};
pub use checkpoint::{IngestCheckpoint, CHECKPOINT_FILE};
pub use error::BootstrapError;
pub use ingest::{IngestConfig, IngestPipeline, IngestResult};
pub use marker::MarkerDir;
