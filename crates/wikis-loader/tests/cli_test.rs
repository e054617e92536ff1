//! Tests for wiring the loader from configuration.

use std::io::Write;

use clap::Parser;
use tempfile::NamedTempFile;

use wikis_indexing::BootstrapConfig;
use wikis_loader::{build_store, Cli, Commands, Overrides};
use wikis_types::Settings;

#[test]
fn test_config_file_then_overrides() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        "es_url = \"http://search.internal:9200\"\nindex_name = \"wikis-test\"\nmarker_dir = \"/data/snapshot\"\nfetch_concurrency = 4"
    )
    .unwrap();

    let cli = Cli::parse_from([
        "wikis-loader",
        "--config",
        file.path().to_str().unwrap(),
        "load",
        "--marker-dir",
        "/mnt/snapshot",
    ]);
    let Commands::Load { es_url, marker_dir } = cli.command else {
        panic!("Expected Load command");
    };

    let mut settings = Settings::load(cli.config.as_deref()).unwrap();
    Overrides {
        es_url,
        marker_dir,
        log_level: cli.log_level,
    }
    .apply(&mut settings);

    assert_eq!(settings.es_url, "http://search.internal:9200");
    assert_eq!(settings.index_name, "wikis-test");
    assert_eq!(settings.marker_dir, "/mnt/snapshot");

    let config = BootstrapConfig::from_settings(&settings);
    assert_eq!(config.index_name, "wikis-test");
    assert_eq!(config.fetch_concurrency, 4);
    assert_eq!(config.marker.path(), std::path::Path::new("/mnt/snapshot"));

    let store = build_store(&settings).unwrap();
    assert_eq!(store.base_url(), "http://search.internal:9200");
}

#[test]
fn test_cli_es_url_fixes_empty_file_value() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(file, "es_url = \"\"").unwrap();

    let cli = Cli::parse_from([
        "wikis-loader",
        "--config",
        file.path().to_str().unwrap(),
        "load",
        "--es-url",
        "http://localhost:9200",
    ]);
    let Commands::Load { es_url, marker_dir } = cli.command else {
        panic!("Expected Load command");
    };

    let mut settings = Settings::load(cli.config.as_deref()).unwrap();
    assert!(settings.validate().is_err());

    Overrides {
        es_url,
        marker_dir,
        log_level: cli.log_level,
    }
    .apply(&mut settings);

    assert_eq!(settings.es_url, "http://localhost:9200");
    assert!(settings.validate().is_ok());
}

#[test]
fn test_marker_override_containing_state_dir_is_rejected() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(file, "state_dir = \"/data/snapshot/state\"").unwrap();

    let cli = Cli::parse_from([
        "wikis-loader",
        "--config",
        file.path().to_str().unwrap(),
        "load",
        "--marker-dir",
        "/data/snapshot",
    ]);
    let Commands::Load { es_url, marker_dir } = cli.command else {
        panic!("Expected Load command");
    };

    let mut settings = Settings::load(cli.config.as_deref()).unwrap();
    Overrides {
        es_url,
        marker_dir,
        log_level: cli.log_level,
    }
    .apply(&mut settings);

    let err = settings.validate().unwrap_err();
    assert!(err.contains("state_dir"));
}
