//! The `watermill preview` command: render one image with the current settings.

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use watermill_core::pipeline::Encoder;
use watermill_core::{Config, TargetFormat, Watermill};

use super::settings::{expand_path, WatermarkArgs};

/// Arguments for the `preview` command.
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Image to preview the watermark on
    pub source: PathBuf,

    /// Watermark image (PNG or WebP with transparency)
    #[arg(short, long)]
    pub watermark: PathBuf,

    /// Where to write the preview; the extension picks the format
    #[arg(short, long, default_value = "preview.png")]
    pub output: PathBuf,

    #[command(flatten)]
    pub look: WatermarkArgs,
}

/// Execute the preview command.
pub async fn execute(args: PreviewArgs, config: Config) -> anyhow::Result<()> {
    let settings = args.look.resolve(&config)?;
    let source = expand_path(&args.source);
    let watermark = expand_path(&args.watermark);
    let output = expand_path(&args.output);

    let image = Watermill::new(config)
        .preview(&source, &watermark, &settings)
        .await
        .with_context(|| format!("Failed to render preview of {}", source.display()))?;

    let format = preview_format(&output);
    let bytes = Encoder::encode(&image, format, None, &output)?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("Failed to write preview to {}", output.display()))?;

    println!(
        "Preview written to {} ({}x{})",
        output.display(),
        image.width(),
        image.height()
    );
    Ok(())
}

fn preview_format(output: &Path) -> TargetFormat {
    output
        .extension()
        .and_then(|e| e.to_str())
        .map(TargetFormat::from_extension)
        .unwrap_or(TargetFormat::Png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    #[test]
    fn test_preview_format_from_extension() {
        assert_eq!(preview_format(Path::new("p.jpg")), TargetFormat::Jpeg);
        assert_eq!(preview_format(Path::new("p.WEBP")), TargetFormat::Webp);
        assert_eq!(preview_format(Path::new("preview")), TargetFormat::Png);
    }

    #[tokio::test]
    async fn test_preview_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        let logo = dir.path().join("logo.png");
        let output = dir.path().join("out.jpg");

        DynamicImage::new_rgb8(2000, 1000)
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 50, Rgba([255, 255, 255, 200])))
            .save_with_format(&logo, ImageFormat::Png)
            .unwrap();

        let args = PreviewArgs {
            source,
            watermark: logo,
            output: output.clone(),
            look: WatermarkArgs::default(),
        };
        execute(args, Config::default()).await.unwrap();

        let (w, h) = image::image_dimensions(&output).unwrap();
        assert_eq!((w, h), (1000, 500));
        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            ImageFormat::Jpeg
        );
    }
}
