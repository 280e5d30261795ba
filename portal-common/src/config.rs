//! Bootstrap configuration
//!
//! A small TOML file read once at startup. Every field has a built-in
//! default, so an absent file or an empty one yields a working setup.
//!
//! # Config File Location Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`PORTAL_CONFIG`)
//! 3. Platform config dir: `<config_dir>/learning-portal/config.toml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PORTAL_CONFIG";

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "learning-portal";

/// Top-level bootstrap configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub master: MasterConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Where the CLI persists the organization collection between runs
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Credentials of the single privileged identity, plus the shared default
/// password for roster users without stored credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterConfig {
    #[serde(default = "default_master_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_password")]
    pub default_password: String,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            username: default_master_username(),
            password: default_password(),
            default_password: default_password(),
        }
    }
}

/// Generation collaborator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on a single generator call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Simulated latency of the offline demo generator
    #[serde(default)]
    pub demo_delay_ms: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            demo_delay_ms: 0,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_master_username() -> String {
    "aiwis".to_string()
}

fn default_password() -> String {
    "1234".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl PortalConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from an explicit file; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the config file location and load it
    ///
    /// A missing file falls back to defaults with a warning; a file that
    /// exists but does not parse is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        let Some(path) = resolve_config_path(cli_arg) else {
            warn!("No config directory available, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file {} not found, using built-in defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }
}

/// Config file path following the location priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PortalConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.master.username, "aiwis");
        assert_eq!(config.master.password, "1234");
        assert_eq!(config.generation.timeout(), Duration::from_secs(60));
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = PortalConfig::from_toml_str("").unwrap();
        assert_eq!(config, PortalConfig::default());
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let config = PortalConfig::from_toml_str(
            r#"
            snapshot_path = "/tmp/portal.json"

            [master]
            password = "s3cret"

            [generation]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.master.username, "aiwis");
        assert_eq!(config.master.password, "s3cret");
        assert_eq!(config.master.default_password, "1234");
        assert_eq!(config.generation.timeout_secs, 5);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/portal.json")));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = PortalConfig::from_toml_str("[logging\nlevel = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cli_arg_wins_path_resolution() {
        let path = resolve_config_path(Some(Path::new("/etc/portal.toml")));
        assert_eq!(path, Some(PathBuf::from("/etc/portal.toml")));
    }
}
