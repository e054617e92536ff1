//! Bootstrap controller.
//!
//! Decides on every start whether the index comes from a snapshot or from a
//! full ingest, and leaves a snapshot behind after a full ingest so later
//! starts take the restore path.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use wikis_scrape::ContentSource;
use wikis_store::{IndexManager, IndexSchema, IndexStore, SnapshotStore, WaitPolicy};
use wikis_types::Settings;

use crate::checkpoint::{IngestCheckpoint, CHECKPOINT_FILE};
use crate::error::BootstrapError;
use crate::ingest::{IngestConfig, IngestPipeline};
use crate::marker::MarkerDir;

/// How the index was made ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Restored from an existing snapshot
    Restored,
    /// Restore found the index already open
    AlreadyPresent,
    /// Built by a full ingest and snapshotted
    Ingested { documents: usize },
}

impl std::fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapOutcome::Restored => write!(f, "restored from snapshot"),
            BootstrapOutcome::AlreadyPresent => write!(f, "index already present"),
            BootstrapOutcome::Ingested { documents } => {
                write!(f, "ingested {} documents", documents)
            }
        }
    }
}

/// Names and locations the controller works with.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub index_name: String,
    pub repository_name: String,
    pub snapshot_name: String,
    /// Repository location as seen by the store
    pub repository_location: String,
    /// Local view of the repository directory
    pub marker: MarkerDir,
    pub checkpoint_path: PathBuf,
    pub wait_policy: WaitPolicy,
    pub fetch_concurrency: usize,
}

impl BootstrapConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let wait_policy = WaitPolicy {
            initial_interval: settings.poll_interval(),
            max_interval: settings.max_poll_interval(),
            deadline: settings.snapshot_timeout(),
            ..WaitPolicy::default()
        };

        Self {
            index_name: settings.index_name.clone(),
            repository_name: settings.repository_name.clone(),
            snapshot_name: settings.snapshot_name.clone(),
            repository_location: settings.repository_location.clone(),
            marker: MarkerDir::new(
                settings.expanded_marker_dir(),
                settings.housekeeping_file.clone(),
            ),
            checkpoint_path: settings.expanded_state_dir().join(CHECKPOINT_FILE),
            wait_policy,
            fetch_concurrency: settings.fetch_concurrency,
        }
    }
}

/// Makes the index ready, either by restore or by full ingest.
pub struct BootstrapController {
    index: IndexManager,
    snapshots: SnapshotStore,
    source: Arc<dyn ContentSource>,
    config: BootstrapConfig,
}

impl BootstrapController {
    pub fn new(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn ContentSource>,
        config: BootstrapConfig,
    ) -> Self {
        Self {
            index: IndexManager::new(Arc::clone(&store)),
            snapshots: SnapshotStore::new(store),
            source,
            config,
        }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Make the index ready. Safe to call on every start.
    ///
    /// Snapshot artifacts in the marker directory select the restore path;
    /// otherwise the index is created, loaded and snapshotted.
    pub async fn ensure_index_ready(&self) -> Result<BootstrapOutcome, BootstrapError> {
        if self.config.marker.has_artifacts()? {
            self.restore().await
        } else {
            self.ingest().await
        }
    }

    /// Register the repository, start a snapshot and wait for it.
    pub async fn snapshot(&self) -> Result<(), BootstrapError> {
        let cfg = &self.config;
        self.snapshots
            .register_repository(&cfg.repository_name, &cfg.repository_location)
            .await?;
        self.snapshots
            .create_snapshot(&cfg.repository_name, &cfg.snapshot_name)
            .await?;
        self.snapshots
            .await_completion(&cfg.repository_name, &cfg.snapshot_name, &cfg.wait_policy)
            .await?;
        Ok(())
    }

    async fn restore(&self) -> Result<BootstrapOutcome, BootstrapError> {
        let cfg = &self.config;
        info!(
            index = %cfg.index_name,
            marker = %cfg.marker.path().display(),
            "Restoring index"
        );

        self.snapshots
            .register_repository(&cfg.repository_name, &cfg.repository_location)
            .await?;

        match self
            .snapshots
            .restore(&cfg.repository_name, &cfg.snapshot_name)
            .await
        {
            Ok(()) => {
                info!(index = %cfg.index_name, "Done");
                Ok(BootstrapOutcome::Restored)
            }
            Err(e) if e.is_restore_conflict() => {
                info!(index = %cfg.index_name, reason = %e, "Index already open, skipping restore");
                Ok(BootstrapOutcome::AlreadyPresent)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ingest(&self) -> Result<BootstrapOutcome, BootstrapError> {
        let cfg = &self.config;
        info!(index = %cfg.index_name, "Initializing index");

        let mut checkpoint = self.create_index().await?;
        checkpoint.save(&cfg.checkpoint_path)?;
        info!(index = %cfg.index_name, "Created");

        info!(index = %cfg.index_name, "Loading data");
        let pipeline = IngestPipeline::new(
            self.index.clone(),
            Arc::clone(&self.source),
            IngestConfig::new(cfg.index_name.clone(), cfg.checkpoint_path.clone())
                .with_fetch_concurrency(cfg.fetch_concurrency),
        );
        let result = pipeline.run(&mut checkpoint).await?;
        let documents = checkpoint.completed.len();
        info!(
            index = %cfg.index_name,
            processed = result.processed,
            skipped = result.skipped,
            documents,
            "Loaded"
        );

        info!(
            repository = %cfg.repository_name,
            snapshot = %cfg.snapshot_name,
            "Creating backup"
        );
        self.snapshot().await?;
        IngestCheckpoint::clear(&cfg.checkpoint_path)?;
        info!(index = %cfg.index_name, documents, "Done");

        Ok(BootstrapOutcome::Ingested { documents })
    }

    /// Create the index and return the checkpoint to ingest with.
    ///
    /// An existing index is only acceptable when a checkpoint from an
    /// interrupted run says we created it.
    async fn create_index(&self) -> Result<IngestCheckpoint, BootstrapError> {
        let cfg = &self.config;
        let previous = IngestCheckpoint::load(&cfg.checkpoint_path, &cfg.index_name)?;

        match self
            .index
            .create_index(&cfg.index_name, &IndexSchema::loader())
            .await
        {
            Ok(()) => {
                if let Some(previous) = previous {
                    warn!(
                        index = %cfg.index_name,
                        stale = previous.processed_count,
                        "Index was missing, discarding checkpoint"
                    );
                }
                Ok(IngestCheckpoint::new(cfg.index_name.clone()))
            }
            Err(e) if e.is_already_exists() => match previous {
                Some(previous) => {
                    info!(
                        index = %cfg.index_name,
                        completed = previous.processed_count,
                        "Index exists from an interrupted run, resuming"
                    );
                    Ok(previous)
                }
                None => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }
}
