//! Watermark flags shared by `run`, `preview` and `preset save`.
//!
//! Settings are layered: `[defaults]` from the config file, then the preset
//! named with `--preset`, then individual flags.

use anyhow::Context;
use clap::Args;
use watermill_core::{Anchor, Config, PresetStore, ProcessingConfig};

use super::types::{ExtraFormatArg, FormatArg};

/// Flags that describe how the watermark looks and how images are written.
#[derive(Args, Debug, Default, Clone)]
pub struct WatermarkArgs {
    /// Placement: TL, TC, TR, CL, CC, CR, BL, BC or BR
    #[arg(long)]
    pub anchor: Option<Anchor>,

    /// Watermark opacity in percent (0-100)
    #[arg(long)]
    pub opacity: Option<u8>,

    /// Distance from the image edges in pixels
    #[arg(long)]
    pub margin: Option<u32>,

    /// Watermark width as a percentage of the image (1-100)
    #[arg(long)]
    pub scale: Option<u32>,

    /// Longest side of the output images in pixels
    #[arg(long)]
    pub size: Option<u32>,

    /// Primary output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Also write this format from the same composite
    #[arg(long, value_enum)]
    pub extra: Option<ExtraFormatArg>,

    /// Size the watermark from the image's shortest edge
    #[arg(long)]
    pub auto: bool,

    /// Start from a saved preset (name or path to a preset file)
    #[arg(long)]
    pub preset: Option<String>,
}

impl WatermarkArgs {
    /// Resolve the layered settings. The result is not validated yet.
    pub fn resolve(&self, config: &Config) -> anyhow::Result<ProcessingConfig> {
        let mut settings = match &self.preset {
            Some(name) => {
                let store = PresetStore::new(config.preset_dir());
                store
                    .load(name)
                    .with_context(|| format!("Failed to load preset '{name}'"))?
                    .settings
            }
            None => config.defaults.clone(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    /// Overwrite the fields that were given on the command line.
    pub fn apply(&self, settings: &mut ProcessingConfig) {
        if let Some(anchor) = self.anchor {
            settings.anchor = anchor;
        }
        if let Some(opacity) = self.opacity {
            settings.opacity = opacity;
        }
        if let Some(margin) = self.margin {
            settings.margin = margin;
        }
        if let Some(scale) = self.scale {
            settings.scale_percent = scale;
        }
        if let Some(size) = self.size {
            settings.max_dimension = size;
        }
        if let Some(format) = self.format {
            settings.output_format = format.into();
        }
        if let Some(extra) = self.extra {
            settings.extra_format = extra.into();
        }
        if self.auto {
            settings.auto_scale = true;
        }
    }
}

/// Expand `~` in a path argument.
pub fn expand_path(path: &std::path::Path) -> std::path::PathBuf {
    let raw = path.to_string_lossy();
    std::path::PathBuf::from(shellexpand::tilde(&raw).into_owned())
}
