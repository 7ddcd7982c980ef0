//! Configuration management for Watermill.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. The `[defaults]` section holds the `ProcessingConfig` a front end
//! starts from before applying its own overrides.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Watermill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default run settings
    pub defaults: ProcessingConfig,

    /// File discovery settings
    pub discovery: DiscoveryConfig,

    /// Worker pool settings
    pub scheduler: SchedulerConfig,

    /// Log and archive settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.watermill.watermill/config.toml
    /// - Linux: ~/.config/watermill/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\watermill\config\config.toml
    ///
    /// Falls back to ~/.watermill/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "watermill", "watermill")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".watermill").join("config.toml")
            })
    }

    /// Get the resolved preset directory path (with ~ expansion).
    pub fn preset_dir(&self) -> PathBuf {
        let path_str = self.general.preset_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}
