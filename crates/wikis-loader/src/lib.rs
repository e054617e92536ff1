//! Wikis loader library exports.
//!
//! This crate provides the `wikis-loader` binary that makes the wikis index
//! ready on container start.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (load, status, create-index, snapshot)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    build_controller, build_fetcher, build_store, handle_create_index, handle_load,
    handle_snapshot, show_status, Overrides,
};
