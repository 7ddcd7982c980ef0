//! Per-file work: decode, composite, resolve conflicts and encode.

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ProcessingConfig, TargetFormat};
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ImageAsset, ProcessingResult};

use super::compositor;
use super::conflict::{ConflictAction, ConflictResolver};
use super::decode::{format_to_string, ImageDecoder};
use super::encode::{output_path, Encoder};
use super::watermark::Watermark;

/// What happened to a file that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Outputs written, in the order they were written
    Written(Vec<PathBuf>),
    /// Everything ran except the final write
    DryRun,
    /// An output already existed and skip mode is on
    Skipped,
}

/// Processes single files of a batch. Cheap to share between tasks.
pub struct ImageProcessor {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: ProcessingConfig,
    watermark: Arc<Watermark>,
}

impl ImageProcessor {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: ProcessingConfig,
        watermark: Arc<Watermark>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            config,
            watermark,
        }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process one asset and turn the outcome into a result row.
    ///
    /// Never fails: errors end up in the returned result.
    pub fn process(&self, asset: &ImageAsset) -> ProcessingResult {
        let start = Instant::now();
        let source = asset.path.clone();
        let dry_run = self.config.dry_run;

        match self.try_process(asset) {
            Ok(ProcessOutcome::Written(outputs)) => {
                ProcessingResult::success(source, outputs, false, start.elapsed())
            }
            Ok(ProcessOutcome::DryRun) => {
                ProcessingResult::success(source, Vec::new(), true, start.elapsed())
            }
            Ok(ProcessOutcome::Skipped) => {
                tracing::debug!("Skipping {:?}: output exists", source);
                ProcessingResult::skipped(source, start.elapsed())
            }
            Err(e) => {
                tracing::warn!("Failed to process {:?}: {}", source, e);
                ProcessingResult::failure(source, e.to_string(), dry_run, start.elapsed())
            }
        }
    }

    /// The fallible part of [`process`](Self::process).
    pub fn try_process(&self, asset: &ImageAsset) -> PipelineResult<ProcessOutcome> {
        let path = asset.path.as_path();
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let formats = self.formats_for(path);
        let stem = self.output_stem(path);

        if !self.config.dry_run {
            let action = ConflictResolver::check(
                &stem,
                self.config.conflict_mode,
                self.config.output_format,
                self.config.extra_format,
            );
            if action == ConflictAction::Skip {
                return Ok(ProcessOutcome::Skipped);
            }
        }

        let decoded = ImageDecoder::decode(path)?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        let composite_start = Instant::now();
        let rendered = compositor::render(&decoded.image, self.watermark.image(), &self.config);
        tracing::trace!("  Composite: {:?}", composite_start.elapsed());

        let exif = decoded.exif.as_deref();

        if self.config.dry_run {
            for format in &formats {
                Encoder::encode(&rendered, *format, exif, &output_path(&stem, *format))?;
            }
            tracing::debug!(
                "Dry run {:?} in {:?} ({}x{} {})",
                path,
                start.elapsed(),
                decoded.width,
                decoded.height,
                format_to_string(decoded.format)
            );
            return Ok(ProcessOutcome::DryRun);
        }

        if let Some(parent) = stem.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut outputs = Vec::with_capacity(formats.len());
        for format in formats {
            outputs.push(Encoder::save(&rendered, &stem, format, exif)?);
        }

        tracing::debug!(
            "Processed {:?} in {:?} -> {} file(s)",
            path,
            start.elapsed(),
            outputs.len()
        );
        Ok(ProcessOutcome::Written(outputs))
    }

    /// Primary format first, then the extra format unless it is the same.
    fn formats_for(&self, source: &Path) -> Vec<TargetFormat> {
        let primary = self.config.output_format.resolve(source);
        let mut formats = vec![primary];
        if let Some(extra) = self.config.extra_format {
            if extra != primary {
                formats.push(extra);
            }
        }
        formats
    }

    pub fn output_stem(&self, source: &Path) -> PathBuf {
        output_stem(&self.input_dir, &self.output_dir, source)
    }

    /// Every path a successful run would write for `source`.
    pub fn planned_outputs(&self, source: &Path) -> Vec<PathBuf> {
        let stem = self.output_stem(source);
        self.formats_for(source)
            .into_iter()
            .map(|format| output_path(&stem, format))
            .collect()
    }
}

/// `output_dir` joined with the source's path relative to `input_dir`,
/// minus its extension. Sources outside `input_dir` keep only their name.
pub fn output_stem(input_dir: &Path, output_dir: &Path, source: &Path) -> PathBuf {
    let relative = source
        .strip_prefix(input_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default());
    output_dir.join(relative.with_extension(""))
}

/// Decode `source` and render it with the batch transform, without writing
/// anything. Used for single-image previews.
pub fn render_preview(
    source: &Path,
    watermark: &Watermark,
    config: &ProcessingConfig,
) -> PipelineResult<DynamicImage> {
    let decoded = ImageDecoder::decode(source)?;
    Ok(compositor::render(&decoded.image, watermark.image(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConflictMode, OutputFormat};
    use crate::types::ProcessStatus;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    fn logo() -> Arc<Watermark> {
        Arc::new(Watermark::from_image(
            "logo.png",
            RgbaImage::from_pixel(60, 20, Rgba([255, 255, 255, 255])),
        ))
    }

    fn asset(path: &Path, format: ImageFormat) -> ImageAsset {
        let (width, height) = image::image_dimensions(path).unwrap();
        ImageAsset {
            path: path.to_path_buf(),
            format,
            width,
            height,
        }
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("in");
        let output = root.path().join("out");
        std::fs::create_dir_all(input.join("sub")).unwrap();
        (root, input, output)
    }

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        DynamicImage::new_rgb8(width, height)
            .save_with_format(path, ImageFormat::Jpeg)
            .unwrap();
    }

    #[test]
    fn test_output_stem_mirrors_tree() {
        let processor = ImageProcessor::new("/in", "/out", ProcessingConfig::default(), logo());
        assert_eq!(
            processor.output_stem(Path::new("/in/sub/photo.v2.jpg")),
            PathBuf::from("/out/sub/photo.v2")
        );
        assert_eq!(
            processor.output_stem(Path::new("/elsewhere/a.png")),
            PathBuf::from("/out/a")
        );
    }

    #[test]
    fn test_source_format_and_extra() {
        let (_root, input, output) = setup();
        let source = input.join("sub").join("shot.jpeg");
        write_jpeg(&source, 300, 200);

        let config = ProcessingConfig {
            extra_format: Some(TargetFormat::Webp),
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));

        assert_eq!(result.status, ProcessStatus::Success, "{}", result.error);
        assert_eq!(
            result.outputs,
            vec![
                output.join("sub").join("shot.jpg"),
                output.join("sub").join("shot.webp")
            ]
        );
        for out in &result.outputs {
            assert!(out.is_file());
        }
    }

    #[test]
    fn test_extra_same_as_primary_written_once() {
        let (_root, input, output) = setup();
        let source = input.join("a.jpg");
        write_jpeg(&source, 100, 100);

        let config = ProcessingConfig {
            output_format: OutputFormat::Png,
            extra_format: Some(TargetFormat::Png),
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));
        assert_eq!(result.outputs, vec![output.join("a.png")]);
    }

    #[test]
    fn test_resized_output() {
        let (_root, input, output) = setup();
        let source = input.join("big.jpg");
        write_jpeg(&source, 1600, 900);

        let config = ProcessingConfig {
            max_dimension: 800,
            output_format: OutputFormat::Png,
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));
        let written = image::open(&result.outputs[0]).unwrap();
        assert_eq!(written.dimensions(), (800, 450));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_root, input, output) = setup();
        let source = input.join("a.jpg");
        write_jpeg(&source, 64, 64);

        let config = ProcessingConfig {
            dry_run: true,
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));

        assert_eq!(result.status, ProcessStatus::Success);
        assert!(result.dry_run);
        assert!(result.outputs.is_empty());
        assert!(!output.exists());
    }

    #[test]
    fn test_skip_mode_leaves_existing_bytes() {
        let (_root, input, output) = setup();
        let source = input.join("a.jpg");
        write_jpeg(&source, 64, 64);
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("a.jpg"), b"original bytes").unwrap();

        let config = ProcessingConfig {
            conflict_mode: ConflictMode::Skip,
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));

        assert_eq!(result.status, ProcessStatus::Skipped);
        assert_eq!(std::fs::read(output.join("a.jpg")).unwrap(), b"original bytes");
    }

    #[test]
    fn test_overwrite_mode_replaces() {
        let (_root, input, output) = setup();
        let source = input.join("a.jpg");
        write_jpeg(&source, 64, 64);
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("a.jpg"), b"original bytes").unwrap();

        let config = ProcessingConfig {
            conflict_mode: ConflictMode::Overwrite,
            ..Default::default()
        };
        let processor = ImageProcessor::new(&input, &output, config, logo());
        let result = processor.process(&asset(&source, ImageFormat::Jpeg));

        assert_eq!(result.status, ProcessStatus::Success);
        assert_ne!(std::fs::read(output.join("a.jpg")).unwrap(), b"original bytes");
    }

    #[test]
    fn test_decode_failure_becomes_error_result() {
        let (_root, input, output) = setup();
        let source = input.join("broken.jpg");
        std::fs::write(&source, b"not an image").unwrap();

        let processor = ImageProcessor::new(&input, &output, ProcessingConfig::default(), logo());
        let result = processor.process(&ImageAsset {
            path: source.clone(),
            format: ImageFormat::Jpeg,
            width: 1,
            height: 1,
        });
        assert_eq!(result.status, ProcessStatus::Error);
        assert!(!result.error.is_empty());
        assert_eq!(result.source, source);
    }

    #[test]
    fn test_render_preview_matches_batch_size() {
        let (_root, input, _output) = setup();
        let source = input.join("a.jpg");
        write_jpeg(&source, 2000, 1000);
        let wm = Watermark::from_image("logo.png", RgbaImage::new(10, 10));
        let preview = render_preview(&source, &wm, &ProcessingConfig::default()).unwrap();
        assert_eq!(preview.dimensions(), (1000, 500));
    }
}
