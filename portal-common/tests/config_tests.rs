//! Configuration loading and graceful degradation
//!
//! - Missing config file: warning + defaults, never an error
//! - Malformed config file: `Config` error
//! - Location priority: CLI argument > PORTAL_CONFIG > platform config dir
//!
//! Uses serial_test: tests that touch PORTAL_CONFIG run sequentially.

use std::env;
use std::io::Write;
use std::path::PathBuf;

use portal_common::config::{resolve_config_path, PortalConfig, CONFIG_ENV_VAR};
use portal_common::Error;
use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_explicit_file() {
    // Given: a config file overriding the master password and timeout
    let file = write_config(
        r#"
        [logging]
        level = "debug"

        [master]
        password = "letmein"

        [generation]
        timeout_secs = 3
        "#,
    );

    // When: loading through the CLI-argument path
    let config = PortalConfig::load(Some(file.path())).unwrap();

    // Then: overrides applied, everything else defaulted
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.master.username, "aiwis");
    assert_eq!(config.master.password, "letmein");
    assert_eq!(config.generation.timeout_secs, 3);
}

#[test]
fn test_missing_file_yields_defaults() {
    // Given: a path inside an empty directory
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    // When/Then: no error, built-in defaults
    let config = PortalConfig::load(Some(&path)).unwrap();
    assert_eq!(config, PortalConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("[generation]\ntimeout_secs = \"soon\"\n");
    let err = PortalConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    // Given: PORTAL_CONFIG set
    env::set_var(CONFIG_ENV_VAR, "/srv/portal/config.toml");

    // When: resolving without a CLI argument
    let path = resolve_config_path(None);

    // Then: the environment variable wins over the platform default
    assert_eq!(path, Some(PathBuf::from("/srv/portal/config.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_wins_over_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/srv/portal/config.toml");

    let file = write_config("[master]\nusername = \"root\"\n");
    let config = PortalConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.master.username, "root");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_file_is_loaded() {
    // Given: PORTAL_CONFIG pointing at a real file
    let file = write_config("snapshot_path = \"/var/lib/portal/orgs.json\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    // When
    let config = PortalConfig::load(None).unwrap();

    // Then
    assert_eq!(config.snapshot_path, Some(PathBuf::from("/var/lib/portal/orgs.json")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_platform_dir_used_without_overrides() {
    env::remove_var(CONFIG_ENV_VAR);
    if let Some(path) = resolve_config_path(None) {
        assert!(path.ends_with("learning-portal/config.toml"));
    }
}
