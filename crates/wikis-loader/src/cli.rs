//! CLI argument parsing for the wikis loader.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

use wikis_store::SchemaKind;

/// Wikis index loader
///
/// Restores the wikis index from its snapshot, or scrapes the most viewed
/// pages, indexes them and takes the snapshot.
#[derive(Parser, Debug)]
#[command(name = "wikis-loader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/wikis/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Loader commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make the index ready: restore from snapshot or ingest and snapshot
    Load {
        /// Override index store URL
        #[arg(long)]
        es_url: Option<String>,

        /// Override snapshot marker directory
        #[arg(long)]
        marker_dir: Option<String>,
    },

    /// Show marker, index and snapshot state
    Status,

    /// Create an index with one of the fixed schemas
    CreateIndex {
        /// Schema to use (loader, searcher)
        #[arg(long, default_value = "loader")]
        schema: SchemaKind,

        /// Index name (default from config)
        #[arg(long)]
        index: Option<String>,
    },

    /// Register the repository and take a snapshot of the index
    Snapshot,
}
