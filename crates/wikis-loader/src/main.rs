//! Wikis Loader
//!
//! Makes the wikis search index ready: restores it from the filesystem
//! snapshot when one exists, otherwise scrapes the most viewed pages,
//! indexes them and takes the snapshot.
//!
//! # Usage
//!
//! ```bash
//! wikis-loader load [--es-url URL] [--marker-dir PATH]
//! wikis-loader status
//! wikis-loader create-index [--schema loader|searcher] [--index NAME]
//! wikis-loader snapshot
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/wikis/config.toml)
//! 3. Environment variables (WIKIS_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use wikis_loader::{
    handle_create_index, handle_load, handle_snapshot, show_status, Cli, Commands, Overrides,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut overrides = Overrides {
        log_level: cli.log_level.clone(),
        ..Overrides::default()
    };

    match cli.command {
        Commands::Load { es_url, marker_dir } => {
            overrides.es_url = es_url;
            overrides.marker_dir = marker_dir;
            handle_load(cli.config.as_deref(), &overrides).await?;
        }
        Commands::Status => {
            show_status(cli.config.as_deref(), &overrides).await?;
        }
        Commands::CreateIndex { schema, index } => {
            handle_create_index(cli.config.as_deref(), &overrides, schema, index.as_deref())
                .await?;
        }
        Commands::Snapshot => {
            handle_snapshot(cli.config.as_deref(), &overrides).await?;
        }
    }

    Ok(())
}
