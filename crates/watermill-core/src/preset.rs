//! Named, reusable processing settings stored as JSON files.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ProcessingConfig;
use crate::error::ConfigError;

const PRESET_EXTENSION: &str = "json";

/// A saved set of processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub created: DateTime<Local>,
    /// Version of the library that wrote the preset
    pub version: String,
    pub settings: ProcessingConfig,
}

/// A directory of `<name>.json` presets.
pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `settings` under `name`, replacing any preset with that name.
    pub fn save(&self, name: &str, settings: &ProcessingConfig) -> Result<PathBuf, ConfigError> {
        validate_name(name)?;
        settings.validate()?;
        std::fs::create_dir_all(&self.dir)?;

        let preset = Preset {
            name: name.to_string(),
            created: Local::now(),
            version: crate::VERSION.to_string(),
            settings: settings.clone(),
        };
        let path = self.path_for(name);
        std::fs::write(&path, serde_json::to_string_pretty(&preset)?)?;
        tracing::info!("Preset '{}' saved to {:?}", name, path);
        Ok(path)
    }

    /// Load a preset by name, or by path when `name_or_path` points at a file.
    /// The settings are validated before they are returned.
    pub fn load(&self, name_or_path: &str) -> Result<Preset, ConfigError> {
        let direct = Path::new(name_or_path);
        let path = if direct.is_file() {
            direct.to_path_buf()
        } else {
            validate_name(name_or_path)?;
            self.path_for(name_or_path)
        };

        let content = std::fs::read_to_string(&path)?;
        let preset: Preset = serde_json::from_str(&content)?;
        preset.settings.validate()?;
        tracing::debug!("Loaded preset '{}' from {:?}", preset.name, path);
        Ok(preset)
    }

    /// Names of all presets in the store, sorted. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PRESET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PRESET_EXTENSION}"))
    }
}

/// Letters, digits, `-`, `_` and spaces; 1 to 64 characters.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.trim().is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ' '));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "preset name '{name}' may only contain letters, digits, '-', '_' and spaces"
        )))
    }
}
