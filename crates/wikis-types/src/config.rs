//! Configuration loading for the wikis loader.
//!
//! Layered config: defaults -> config file -> env vars (WIKIS_*) -> CLI flags.
//! The default config file lives at ~/.config/wikis/config.toml.

use config::{Config, ConfigError, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::WikisError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the index store (Elasticsearch-compatible HTTP API)
    #[serde(default = "default_es_url")]
    pub es_url: String,

    /// Name of the index documents are loaded into
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Snapshot repository name
    #[serde(default = "default_repository_name")]
    pub repository_name: String,

    /// Snapshot name inside the repository
    #[serde(default = "default_snapshot_name")]
    pub snapshot_name: String,

    /// Directory probed at startup for snapshot artifacts
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,

    /// Repository location as seen by the index store
    #[serde(default = "default_marker_dir")]
    pub repository_location: String,

    /// File in the marker directory that never counts as an artifact
    #[serde(default = "default_housekeeping_file")]
    pub housekeeping_file: String,

    /// Page holding the ranking tables
    #[serde(default = "default_ranking_url")]
    pub ranking_url: String,

    /// MediaWiki API endpoint used to fetch article bodies
    #[serde(default = "default_wiki_api_url")]
    pub wiki_api_url: String,

    /// User-Agent sent to the encyclopedia
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory for the ingest checkpoint (must not be the marker directory)
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Per-request timeout for outbound HTTP calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries per upstream request after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Article fetches kept in flight during ingest
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// First delay between snapshot status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for the delay between snapshot status polls
    #[serde(default = "default_max_poll_interval_ms")]
    pub max_poll_interval_ms: u64,

    /// Give up waiting for a snapshot after this long
    #[serde(default = "default_snapshot_timeout_secs")]
    pub snapshot_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_es_url() -> String {
    "http://elasticsearch:9200".to_string()
}

fn default_index_name() -> String {
    "wikis".to_string()
}

fn default_repository_name() -> String {
    "wikisrepo".to_string()
}

fn default_snapshot_name() -> String {
    "wikis".to_string()
}

fn default_marker_dir() -> String {
    "/snapshot".to_string()
}

fn default_housekeeping_file() -> String {
    ".gitignore".to_string()
}

fn default_ranking_url() -> String {
    "https://en.wikipedia.org/wiki/Wikipedia:Multiyear_ranking_of_most_viewed_pages".to_string()
}

fn default_wiki_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    concat!("wikis-loader/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_state_dir() -> String {
    ProjectDirs::from("", "", "wikis")
        .map(|p| p.data_local_dir().join("state"))
        .unwrap_or_else(|| PathBuf::from("./state"))
        .to_string_lossy()
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_fetch_concurrency() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_interval_ms() -> u64 {
    10_000
}

fn default_snapshot_timeout_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            es_url: default_es_url(),
            index_name: default_index_name(),
            repository_name: default_repository_name(),
            snapshot_name: default_snapshot_name(),
            marker_dir: default_marker_dir(),
            repository_location: default_marker_dir(),
            housekeeping_file: default_housekeeping_file(),
            ranking_url: default_ranking_url(),
            wiki_api_url: default_wiki_api_url(),
            user_agent: default_user_agent(),
            state_dir: default_state_dir(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            fetch_concurrency: default_fetch_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_interval_ms: default_max_poll_interval_ms(),
            snapshot_timeout_secs: default_snapshot_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

fn config_err(e: ConfigError) -> WikisError {
    WikisError::Config(e.to_string())
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/wikis/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (WIKIS_*)
    ///
    /// CLI flags should be applied by the caller after this returns, and
    /// [`Settings::validate`] run on the result.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, WikisError> {
        let config_dir = ProjectDirs::from("", "", "wikis")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("es_url", default_es_url())
            .map_err(config_err)?
            .set_default("index_name", default_index_name())
            .map_err(config_err)?
            .set_default("repository_name", default_repository_name())
            .map_err(config_err)?
            .set_default("snapshot_name", default_snapshot_name())
            .map_err(config_err)?
            .set_default("marker_dir", default_marker_dir())
            .map_err(config_err)?
            .set_default("repository_location", default_marker_dir())
            .map_err(config_err)?
            .set_default("housekeeping_file", default_housekeeping_file())
            .map_err(config_err)?
            .set_default("state_dir", default_state_dir())
            .map_err(config_err)?
            .set_default("log_level", default_log_level())
            .map_err(config_err)?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // WIKIS_ES_URL, WIKIS_MARKER_DIR, WIKIS_FETCH_CONCURRENCY, ...
        builder = builder.add_source(Environment::with_prefix("WIKIS").try_parsing(true));

        let settings: Settings = builder
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)?;

        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.es_url.trim().is_empty() {
            return Err("es_url must not be empty".to_string());
        }
        if self.fetch_concurrency == 0 {
            return Err("fetch_concurrency must be > 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be > 0".to_string());
        }
        if self.max_poll_interval_ms < self.poll_interval_ms {
            return Err(format!(
                "max_poll_interval_ms ({}) must be >= poll_interval_ms ({})",
                self.max_poll_interval_ms, self.poll_interval_ms
            ));
        }
        if self.snapshot_timeout_secs == 0 {
            return Err("snapshot_timeout_secs must be > 0".to_string());
        }
        let state_dir = self.expanded_state_dir();
        let marker_dir = self.expanded_marker_dir();
        if state_dir.starts_with(&marker_dir) {
            // A checkpoint inside the marker dir reads as a snapshot artifact
            return Err(format!(
                "state_dir ({}) must not be inside marker_dir ({})",
                state_dir.display(),
                marker_dir.display()
            ));
        }
        Ok(())
    }

    /// Marker directory with ~ expanded.
    pub fn expanded_marker_dir(&self) -> PathBuf {
        expand_home(&self.marker_dir)
    }

    /// State directory with ~ expanded.
    pub fn expanded_state_dir(&self) -> PathBuf {
        expand_home(&self.state_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.snapshot_timeout_secs)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
