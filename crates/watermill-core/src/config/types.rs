//! Sub-configuration structs and the per-run `ProcessingConfig` value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where presets are stored
    pub preset_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            preset_dir: PathBuf::from("~/.watermill/presets"),
        }
    }
}

/// One of the nine placement codes on a 3x3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Anchor {
    #[serde(rename = "TL")]
    TopLeft,
    #[serde(rename = "TC")]
    TopCenter,
    #[serde(rename = "TR")]
    TopRight,
    #[serde(rename = "CL")]
    CenterLeft,
    #[serde(rename = "CC")]
    Center,
    #[serde(rename = "CR")]
    CenterRight,
    #[serde(rename = "BL")]
    BottomLeft,
    #[serde(rename = "BC")]
    BottomCenter,
    #[default]
    #[serde(rename = "BR")]
    BottomRight,
}

/// Horizontal component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    /// Two-letter code: row (T/C/B) then column (L/C/R).
    pub fn code(self) -> &'static str {
        match self {
            Anchor::TopLeft => "TL",
            Anchor::TopCenter => "TC",
            Anchor::TopRight => "TR",
            Anchor::CenterLeft => "CL",
            Anchor::Center => "CC",
            Anchor::CenterRight => "CR",
            Anchor::BottomLeft => "BL",
            Anchor::BottomCenter => "BC",
            Anchor::BottomRight => "BR",
        }
    }

    pub fn horizontal(self) -> HAlign {
        let code = self.code();
        if code.contains('L') {
            HAlign::Left
        } else if code.contains('R') {
            HAlign::Right
        } else {
            HAlign::Center
        }
    }

    pub fn vertical(self) -> VAlign {
        let code = self.code();
        if code.contains('T') {
            VAlign::Top
        } else if code.contains('B') {
            VAlign::Bottom
        } else {
            VAlign::Center
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Anchor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Anchor::ALL
            .into_iter()
            .find(|a| a.code() == upper)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "anchor must be one of TL, TC, TR, CL, CC, CR, BL, BC, BR (got {s:?})"
                ))
            })
    }
}

/// A concrete encoder target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
}

impl TargetFormat {
    /// File extension written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
        }
    }

    /// Map a source file extension to an encoder. `jpg` and `jpeg` both mean
    /// JPEG; anything without a dedicated encoder falls back to PNG.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => TargetFormat::Jpeg,
            "webp" => TargetFormat::Webp,
            _ => TargetFormat::Png,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Jpeg => write!(f, "jpeg"),
            TargetFormat::Png => write!(f, "png"),
            TargetFormat::Webp => write!(f, "webp"),
        }
    }
}

/// Primary output format of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Re-encode in the source file's own format
    #[default]
    Source,
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// The explicit target, if this is not source-preserving.
    pub fn target(self) -> Option<TargetFormat> {
        match self {
            OutputFormat::Source => None,
            OutputFormat::Jpeg => Some(TargetFormat::Jpeg),
            OutputFormat::Png => Some(TargetFormat::Png),
            OutputFormat::Webp => Some(TargetFormat::Webp),
        }
    }

    /// Resolve to a concrete encoder for the given source file.
    pub fn resolve(self, source: &Path) -> TargetFormat {
        self.target().unwrap_or_else(|| {
            source
                .extension()
                .and_then(|e| e.to_str())
                .map(TargetFormat::from_extension)
                .unwrap_or(TargetFormat::Png)
        })
    }
}

/// Policy for outputs that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictMode {
    /// Let the front end decide; overwrites when nobody can be asked
    #[default]
    Ask,
    Overwrite,
    Skip,
}

/// Settings for a single watermarking run.
///
/// Built once per run and shared read-only by every task. Call
/// [`ProcessingConfig::validate`] before handing it to the scheduler; values
/// out of range are rejected, never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Watermark placement
    pub anchor: Anchor,

    /// Watermark opacity, 0-100
    pub opacity: u8,

    /// Distance from the touched edges in pixels
    pub margin: u32,

    /// Watermark size as a percentage of the base image, 1-100
    pub scale_percent: u32,

    /// Longest side of the output image in pixels
    pub max_dimension: u32,

    /// Primary output format
    pub output_format: OutputFormat,

    /// Optional second format written from the same composite
    pub extra_format: Option<TargetFormat>,

    /// Size the watermark from the shortest edge instead of the width
    pub auto_scale: bool,

    /// Run the whole pipeline without writing anything
    pub dry_run: bool,

    /// Zip the output directory after the run
    pub create_archive: bool,

    /// What to do when an output already exists
    pub conflict_mode: ConflictMode,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            anchor: Anchor::BottomRight,
            opacity: 80,
            margin: 25,
            scale_percent: 30,
            max_dimension: 1000,
            output_format: OutputFormat::Source,
            extra_format: None,
            auto_scale: false,
            dry_run: false,
            create_archive: false,
            conflict_mode: ConflictMode::Ask,
        }
    }
}

/// File discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Descend into subdirectories
    pub recursive: bool,

    /// Deepest level below the input directory that is searched
    pub max_depth: usize,

    /// Enumeration stops once this many images have been found
    pub max_batch_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: 50,
            max_batch_size: 5000,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of parallel workers (0 = available parallelism)
    pub parallel_workers: usize,

    /// Hard ceiling on parallel workers, bounds decoded images in memory
    pub max_workers: usize,

    /// Max finished results buffered before workers wait on the aggregator
    pub buffer_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 0,
            max_workers: 8,
            buffer_size: 64,
        }
    }
}

impl SchedulerConfig {
    /// Effective worker count for this machine.
    pub fn worker_count(&self) -> usize {
        let requested = if self.parallel_workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.parallel_workers
        };
        requested.clamp(1, self.max_workers.max(1))
    }
}

/// Log and archive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the CSV log written at the root of the output directory
    pub log_file_name: String,

    /// Prefix of the timestamped archive name
    pub archive_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_file_name: "watermark_processing_log.csv".to_string(),
            archive_prefix: "watermarked_batch".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
