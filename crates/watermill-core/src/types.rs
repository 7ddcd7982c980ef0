//! Core data types for the Watermill pipeline.
//!
//! These types describe what goes into a run (discovered assets) and what
//! comes out of it (one result per file plus a run summary).

use chrono::{DateTime, Local};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder written to the log in place of output paths for dry runs.
pub const DRY_RUN_PLACEHOLDER: &str = "DRY RUN";

/// Placeholder written to the log in place of output paths for skipped files.
pub const SKIPPED_PLACEHOLDER: &str = "SKIPPED - File exists";

/// A source image found by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Full path to the file
    pub path: PathBuf,
    /// Format detected from the file content
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

/// Final state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessStatus {
    Success,
    Error,
    Skipped,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Success => write!(f, "SUCCESS"),
            ProcessStatus::Error => write!(f, "ERROR"),
            ProcessStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// The outcome of processing a single source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// When the file finished processing
    pub timestamp: DateTime<Local>,

    /// Path of the source image
    pub source: PathBuf,

    /// Paths actually written (empty for dry runs, skips and errors)
    pub outputs: Vec<PathBuf>,

    pub status: ProcessStatus,

    /// Error detail; empty unless `status` is `Error`
    pub error: String,

    /// Whether the file went through a dry run
    pub dry_run: bool,

    /// Wall time spent on this file
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl ProcessingResult {
    pub fn success(source: PathBuf, outputs: Vec<PathBuf>, dry_run: bool, elapsed: Duration) -> Self {
        Self {
            timestamp: Local::now(),
            source,
            outputs,
            status: ProcessStatus::Success,
            error: String::new(),
            dry_run,
            elapsed,
        }
    }

    pub fn skipped(source: PathBuf, elapsed: Duration) -> Self {
        Self {
            timestamp: Local::now(),
            source,
            outputs: Vec::new(),
            status: ProcessStatus::Skipped,
            error: String::new(),
            dry_run: false,
            elapsed,
        }
    }

    pub fn failure(source: PathBuf, error: impl Into<String>, dry_run: bool, elapsed: Duration) -> Self {
        Self {
            timestamp: Local::now(),
            source,
            outputs: Vec::new(),
            status: ProcessStatus::Error,
            error: error.into(),
            dry_run,
            elapsed,
        }
    }

    /// The `output_file` column of the processing log.
    pub fn output_field(&self) -> String {
        match self.status {
            ProcessStatus::Skipped => SKIPPED_PLACEHOLDER.to_string(),
            ProcessStatus::Error => String::new(),
            ProcessStatus::Success if self.dry_run => DRY_RUN_PLACEHOLDER.to_string(),
            ProcessStatus::Success => self
                .outputs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// The `status` column of the processing log, which only knows
    /// SUCCESS and ERROR; skips are successes with a placeholder output.
    pub fn log_status(&self) -> &'static str {
        match self.status {
            ProcessStatus::Error => "ERROR",
            ProcessStatus::Success | ProcessStatus::Skipped => "SUCCESS",
        }
    }
}

/// Aggregate of a completed or cancelled run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Assets handed to the scheduler
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Cancellation was requested before every asset was dispatched
    pub cancelled: bool,

    pub dry_run: bool,

    /// Processing log, when one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Archive of the output tree, when one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,

    /// Log or archive failures; image outputs are unaffected by these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl RunSummary {
    /// Files that produced a result.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Tally a set of results.
    pub fn from_results(total: usize, results: &[ProcessingResult]) -> Self {
        let mut summary = Self {
            total,
            ..Default::default()
        };
        for result in results {
            match result.status {
                ProcessStatus::Success => summary.succeeded += 1,
                ProcessStatus::Error => summary.failed += 1,
                ProcessStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_field_joins_paths() {
        let result = ProcessingResult::success(
            PathBuf::from("in/a.jpg"),
            vec![PathBuf::from("out/a.jpg"), PathBuf::from("out/a.webp")],
            false,
            Duration::ZERO,
        );
        assert_eq!(result.output_field(), "out/a.jpg; out/a.webp");
        assert_eq!(result.log_status(), "SUCCESS");
    }

    #[test]
    fn test_output_field_placeholders() {
        let dry = ProcessingResult::success(PathBuf::from("a.jpg"), vec![], true, Duration::ZERO);
        assert_eq!(dry.output_field(), DRY_RUN_PLACEHOLDER);

        let skipped = ProcessingResult::skipped(PathBuf::from("a.jpg"), Duration::ZERO);
        assert_eq!(skipped.output_field(), SKIPPED_PLACEHOLDER);
        assert_eq!(skipped.log_status(), "SUCCESS");

        let failed =
            ProcessingResult::failure(PathBuf::from("a.jpg"), "boom", false, Duration::ZERO);
        assert_eq!(failed.output_field(), "");
        assert_eq!(failed.log_status(), "ERROR");
        assert_eq!(failed.error, "boom");
    }

    #[test]
    fn test_summary_from_results() {
        let results = vec![
            ProcessingResult::success(PathBuf::from("a"), vec![], false, Duration::ZERO),
            ProcessingResult::success(PathBuf::from("b"), vec![], false, Duration::ZERO),
            ProcessingResult::skipped(PathBuf::from("c"), Duration::ZERO),
            ProcessingResult::failure(PathBuf::from("d"), "x", false, Duration::ZERO),
        ];
        let summary = RunSummary::from_results(5, &results);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed(), 4);
    }

    #[test]
    fn test_summary_serializes_elapsed_as_millis() {
        let summary = RunSummary {
            elapsed: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["elapsed"], 1500);
        assert!(json.get("archive_path").is_none());
    }
}
