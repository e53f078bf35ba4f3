//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/usage/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/usage/` (~/.config/usage/)
//! - State/Logs: `$XDG_STATE_HOME/usage/` (~/.local/state/usage/)
//!
//! The analytics property dotfile is not covered by XDG: it lives in the
//! home directory (see [`crate::properties::FileProperties`]) unless
//! `analytics.properties_dir` says otherwise.

use crate::error::{Error, Result};
use crate::session::{AnalyticsOpt, AnalyticsOptions, DEFAULT_COLLECTION_URL};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics session configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Property id hits are reported under (e.g. `UA-12345-1`)
    pub tracking_id: Option<String>,

    /// Application name; also names the properties dotfile
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application version, sent as `av`
    pub application_version: Option<String>,

    /// Collection endpoint override
    pub collection_url: Option<String>,

    /// Directory for the properties dotfile (default: home directory)
    pub properties_dir: Option<PathBuf>,

    /// `opt_out` (default) or `opt_in`
    #[serde(default)]
    pub opt: AnalyticsOpt,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            tracking_id: None,
            application_name: default_application_name(),
            application_version: None,
            collection_url: None,
            properties_dir: None,
            opt: AnalyticsOpt::default(),
        }
    }
}

fn default_application_name() -> String {
    "usage".to_string()
}

impl AnalyticsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        match &self.tracking_id {
            None => {
                return Err(Error::Config(
                    "analytics.tracking_id is required to send hits".to_string(),
                ))
            }
            Some(id) if id.trim().is_empty() => {
                return Err(Error::Config(
                    "analytics.tracking_id must not be empty".to_string(),
                ))
            }
            Some(_) => {}
        }

        if self.application_name.trim().is_empty() {
            return Err(Error::Config(
                "analytics.application_name must not be empty".to_string(),
            ));
        }

        if let Some(url) = &self.collection_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "analytics.collection_url must be an http(s) URL, got {:?}",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Session options described by this configuration
    pub fn to_options(&self) -> Result<AnalyticsOptions> {
        self.validate()?;

        let tracking_id = self.tracking_id.clone().unwrap_or_default();
        let mut options = AnalyticsOptions::new(tracking_id, self.application_name.clone())
            .with_collection_url(
                self.collection_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLLECTION_URL.to_string()),
            )
            .with_opt(self.opt);
        if let Some(version) = &self.application_version {
            options = options.with_version(version.clone());
        }
        Ok(options)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/usage/config.toml` (~/.config/usage/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("usage").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/usage/` (~/.local/state/usage/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("usage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analytics.tracking_id.is_none());
        assert_eq!(config.analytics.application_name, "usage");
        assert_eq!(config.analytics.opt, AnalyticsOpt::OptOut);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
tracking_id = "UA-12345-1"
application_name = "my tool"
application_version = "2.0.1"
collection_url = "http://localhost:9000/collect"
properties_dir = "/tmp/props"
opt = "opt_in"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.analytics.tracking_id.as_deref(), Some("UA-12345-1"));
        assert_eq!(config.analytics.application_name, "my tool");
        assert_eq!(
            config.analytics.properties_dir,
            Some(PathBuf::from("/tmp/props"))
        );
        assert_eq!(config.analytics.opt, AnalyticsOpt::OptIn);
        assert_eq!(config.logging.level, "debug");

        let options = config.analytics.to_options().unwrap();
        assert_eq!(options.tracking_id, "UA-12345-1");
        assert_eq!(options.application_version.as_deref(), Some("2.0.1"));
        assert_eq!(options.collection_url, "http://localhost:9000/collect");
        assert_eq!(options.opt, AnalyticsOpt::OptIn);
    }

    #[test]
    fn test_analytics_config_validation() {
        // Tracking id is required
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_err());

        let config = AnalyticsConfig {
            tracking_id: Some("UA-1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.to_options().unwrap().collection_url,
            DEFAULT_COLLECTION_URL
        );

        let config = AnalyticsConfig {
            tracking_id: Some("UA-1".to_string()),
            collection_url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ntracking_id = \"UA-9\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analytics.tracking_id.as_deref(), Some("UA-9"));
        assert_eq!(config.analytics.application_name, "usage");
    }

    #[test]
    fn test_load_from_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[analytics\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
