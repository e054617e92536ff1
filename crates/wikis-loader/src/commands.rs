//! Command implementations for the wikis loader.
//!
//! Handles:
//! - load: restore the index from its snapshot, or ingest and snapshot
//! - status: report marker, index and snapshot state
//! - create-index: create an index with a fixed schema
//! - snapshot: take a snapshot of the current index

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use wikis_indexing::{BootstrapConfig, BootstrapController};
use wikis_scrape::{FetcherConfig, WikiFetcher};
use wikis_store::{HttpIndexStore, HttpStoreConfig, IndexManager, SchemaKind, SnapshotStore};
use wikis_types::Settings;

/// Values given on the command line, applied over loaded settings.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub es_url: Option<String>,
    pub marker_dir: Option<String>,
    pub log_level: Option<String>,
}

impl Overrides {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(es_url) = &self.es_url {
            settings.es_url = es_url.clone();
        }
        if let Some(marker_dir) = &self.marker_dir {
            settings.marker_dir = marker_dir.clone();
        }
        if let Some(log_level) = &self.log_level {
            settings.log_level = log_level.clone();
        }
    }
}

/// Load configuration, apply CLI overrides and initialize logging.
fn prepare(config_path: Option<&str>, overrides: &Overrides) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    overrides.apply(&mut settings);
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(&settings.log_level)?;
    Ok(settings)
}

fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Index store client for `settings`.
pub fn build_store(settings: &Settings) -> Result<Arc<HttpIndexStore>> {
    let config =
        HttpStoreConfig::new(settings.es_url.clone()).with_timeout(settings.request_timeout());
    let store = HttpIndexStore::new(config).context("Failed to create index store client")?;
    Ok(Arc::new(store))
}

/// Upstream fetcher for `settings`.
pub fn build_fetcher(settings: &Settings) -> Result<Arc<WikiFetcher>> {
    let config = FetcherConfig {
        ranking_url: settings.ranking_url.clone(),
        api_url: settings.wiki_api_url.clone(),
        user_agent: settings.user_agent.clone(),
        timeout: settings.request_timeout(),
        max_retries: settings.max_retries,
    };
    let fetcher = WikiFetcher::new(config).context("Failed to create wiki fetcher")?;
    Ok(Arc::new(fetcher))
}

/// Bootstrap controller wired to the HTTP store and wiki fetcher.
pub fn build_controller(settings: &Settings) -> Result<BootstrapController> {
    Ok(BootstrapController::new(
        build_store(settings)?,
        build_fetcher(settings)?,
        BootstrapConfig::from_settings(settings),
    ))
}

/// Make the index ready.
pub async fn handle_load(config_path: Option<&str>, overrides: &Overrides) -> Result<()> {
    let settings = prepare(config_path, overrides)?;

    info!("Wikis loader starting...");
    info!("  Index store: {}", settings.es_url);
    info!("  Index: {}", settings.index_name);
    info!("  Marker directory: {:?}", settings.expanded_marker_dir());
    info!("  State directory: {:?}", settings.expanded_state_dir());

    let outcome = build_controller(&settings)?
        .ensure_index_ready()
        .await
        .context("Failed to make index ready")?;

    println!("Index '{}' ready: {}", settings.index_name, outcome);
    Ok(())
}

/// Print marker, index and snapshot state.
pub async fn show_status(config_path: Option<&str>, overrides: &Overrides) -> Result<()> {
    let settings = prepare(config_path, overrides)?;
    let config = BootstrapConfig::from_settings(&settings);
    let store = build_store(&settings)?;

    let artifacts = config
        .marker
        .artifacts()
        .context("Failed to read marker directory")?;
    if artifacts.is_empty() {
        println!(
            "Marker directory {:?}: no snapshot artifacts (next load ingests)",
            config.marker.path()
        );
    } else {
        println!(
            "Marker directory {:?}: {} snapshot artifact(s) (next load restores)",
            config.marker.path(),
            artifacts.len()
        );
    }

    let exists = IndexManager::new(store.clone())
        .index_exists(&settings.index_name)
        .await
        .context("Failed to check index")?;
    println!(
        "Index '{}': {}",
        settings.index_name,
        if exists { "present" } else { "absent" }
    );

    let state = SnapshotStore::new(store)
        .state(&settings.repository_name, &settings.snapshot_name)
        .await
        .context("Failed to read snapshot status")?;
    if state.exists {
        println!(
            "Snapshot '{}/{}': {}",
            settings.repository_name, settings.snapshot_name, state.completion
        );
    } else {
        println!(
            "Snapshot '{}/{}': not found",
            settings.repository_name, settings.snapshot_name
        );
    }

    if config.checkpoint_path.exists() {
        println!("Ingest checkpoint: {:?}", config.checkpoint_path);
    }

    Ok(())
}

/// Create an index with a fixed schema.
pub async fn handle_create_index(
    config_path: Option<&str>,
    overrides: &Overrides,
    schema: SchemaKind,
    index: Option<&str>,
) -> Result<()> {
    let settings = prepare(config_path, overrides)?;
    let name = index.unwrap_or(&settings.index_name);

    IndexManager::new(build_store(&settings)?)
        .create_index(name, &schema.build())
        .await
        .with_context(|| format!("Failed to create index '{}'", name))?;

    println!("Created index '{}' ({} schema)", name, schema.as_str());
    Ok(())
}

/// Snapshot the index and wait for completion.
pub async fn handle_snapshot(config_path: Option<&str>, overrides: &Overrides) -> Result<()> {
    let settings = prepare(config_path, overrides)?;

    build_controller(&settings)?
        .snapshot()
        .await
        .context("Failed to snapshot index")?;

    println!(
        "Snapshot '{}/{}' complete",
        settings.repository_name, settings.snapshot_name
    );
    Ok(())
}
