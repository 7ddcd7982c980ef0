//! Watermill Core - Embeddable batch watermarking library.
//!
//! Watermill takes a directory of raster images and composites a
//! semi-transparent logo onto each one, optionally resizing and re-encoding,
//! then writes the results to a mirrored output tree with a CSV processing
//! log and an optional ZIP archive.
//!
//! # Architecture
//!
//! ```text
//! Discover → (per file, in parallel) Decode → Resize → Composite → Encode → Log/Archive
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use watermill_core::{BatchRequest, CancelToken, Config, Watermill};
//!
//! #[tokio::main]
//! async fn main() -> watermill_core::Result<()> {
//!     let watermill = Watermill::new(Config::load()?);
//!     let request = BatchRequest::new("./photos", "./out", "./logo.png", watermill.config().defaults.clone());
//!
//!     let outcome = watermill.run(&request, None, CancelToken::new()).await?;
//!     println!("{} images watermarked", outcome.summary.succeeded);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod preset;
pub mod report;
pub mod types;

// Re-exports for convenient access
pub use config::{Anchor, Config, ConflictMode, OutputFormat, ProcessingConfig, TargetFormat};
pub use error::{ConfigError, PipelineError, PipelineResult, ReportError, Result, WatermillError};
pub use pipeline::{
    BatchOutcome, BatchRequest, CancelToken, Discovery, ProgressEvent, RunStage, Scheduler,
    Watermark,
};
pub use preset::{Preset, PresetStore};
pub use types::{ImageAsset, ProcessStatus, ProcessingResult, RunSummary};

use image::DynamicImage;
use std::path::Path;
use tokio::sync::mpsc::UnboundedSender;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The main entry point: discovery, batch runs and previews from one config.
pub struct Watermill {
    config: Config,
}

impl Watermill {
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Watermill v{}", VERSION);
        Self { config }
    }

    /// Create a Watermill instance from the config file, or defaults.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Config::load()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find usable images with the configured discovery settings.
    pub fn discover(&self, directory: &Path) -> Discovery {
        pipeline::FileDiscovery::new(self.config.discovery.clone()).discover(directory)
    }

    /// Discover the request's input directory and process everything found.
    pub async fn run(
        &self,
        request: &BatchRequest,
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: CancelToken,
    ) -> Result<BatchOutcome> {
        request.validate()?;
        let found = self.discover(&request.input_dir);
        tracing::info!(
            "Found {} images ({} ignored){}",
            found.assets.len(),
            found.ignored,
            if found.truncated { ", batch limit reached" } else { "" }
        );
        self.run_assets(request, found.assets, progress, cancel).await
    }

    /// Process an explicit list of assets.
    pub async fn run_assets(
        &self,
        request: &BatchRequest,
        assets: Vec<ImageAsset>,
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: CancelToken,
    ) -> Result<BatchOutcome> {
        let scheduler = Scheduler::new(self.config.scheduler.clone(), self.config.output.clone());
        scheduler.run(request, assets, progress, cancel).await
    }

    /// Render one image exactly as a batch would, without writing anything.
    pub async fn preview(
        &self,
        source: &Path,
        watermark_path: &Path,
        settings: &ProcessingConfig,
    ) -> Result<DynamicImage> {
        settings.validate()?;
        let watermark = Watermark::load(watermark_path)?;
        let source = source.to_path_buf();
        let settings = settings.clone();
        let image = tokio::task::spawn_blocking(move || {
            pipeline::render_preview(&source, &watermark, &settings)
        })
        .await
        .map_err(|e| PipelineError::Worker {
            path: watermark_path.to_path_buf(),
            message: e.to_string(),
        })??;
        Ok(image)
    }

    /// The preset store at the configured location.
    pub fn presets(&self) -> PresetStore {
        PresetStore::new(self.config.preset_dir())
    }
}
