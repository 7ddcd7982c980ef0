//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, ProcessingConfig};

impl ProcessingConfig {
    /// Validate run settings are within acceptable ranges.
    ///
    /// This is the only place these ranges are checked; every front end
    /// (CLI flags, config file defaults, presets) goes through it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.opacity > 100 {
            return Err(ConfigError::ValidationError(format!(
                "opacity must be between 0 and 100 (got {})",
                self.opacity
            )));
        }
        if !(1..=100).contains(&self.scale_percent) {
            return Err(ConfigError::ValidationError(format!(
                "scale_percent must be between 1 and 100 (got {})",
                self.scale_percent
            )));
        }
        if self.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "max_dimension must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.defaults.validate()?;
        if self.discovery.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "discovery.max_depth must be > 0".into(),
            ));
        }
        if self.discovery.max_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "discovery.max_batch_size must be > 0".into(),
            ));
        }
        if self.scheduler.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "scheduler.max_workers must be > 0".into(),
            ));
        }
        if self.scheduler.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "scheduler.buffer_size must be > 0".into(),
            ));
        }
        if self.output.log_file_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.log_file_name must not be empty".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\" (got {:?})",
                self.logging.format
            )));
        }
        Ok(())
    }
}
