//! Output encoding: JPEG, PNG and WebP writers.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::TargetFormat;
use crate::error::PipelineError;

use super::metadata::MetadataExtractor;

/// JPEG quality used for every JPEG output.
pub const JPEG_QUALITY: u8 = 95;

/// Encodes composited images to their target formats.
pub struct Encoder;

impl Encoder {
    /// Encode `image` to an in-memory buffer.
    ///
    /// JPEG output is flattened to RGB and carries `exif` when given; PNG and
    /// WebP keep the alpha channel. `path` is only used for error messages.
    ///
    /// WebP is always lossless (`image` has no lossy WebP encoder), so those
    /// files come out several times larger than a quality-90 lossy encode.
    pub fn encode(
        image: &DynamicImage,
        format: TargetFormat,
        exif: Option<&[u8]>,
        path: &Path,
    ) -> Result<Vec<u8>, PipelineError> {
        let encode_err = |e: image::ImageError| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let mut buf = Vec::new();
        match format {
            TargetFormat::Jpeg => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
                    .write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_err)?;
                if let Some(raw) = exif {
                    MetadataExtractor::insert_into_jpeg(&mut buf, raw);
                }
            }
            TargetFormat::Webp => {
                let rgba = image.to_rgba8();
                WebPEncoder::new_lossless(&mut buf)
                    .write_image(
                        rgba.as_raw(),
                        rgba.width(),
                        rgba.height(),
                        ExtendedColorType::Rgba8,
                    )
                    .map_err(encode_err)?;
            }
            TargetFormat::Png => {
                let encoder =
                    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
                let written = if image.color().has_alpha() {
                    let rgba = image.to_rgba8();
                    encoder.write_image(
                        rgba.as_raw(),
                        rgba.width(),
                        rgba.height(),
                        ExtendedColorType::Rgba8,
                    )
                } else {
                    let rgb = image.to_rgb8();
                    encoder.write_image(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                };
                written.map_err(encode_err)?;
            }
        }
        Ok(buf)
    }

    /// Encode and write `image` next to `stem`, returning the path written.
    ///
    /// The format's extension is appended to `stem`, so `out/photo.v2` becomes
    /// `out/photo.v2.jpg`.
    pub fn save(
        image: &DynamicImage,
        stem: &Path,
        format: TargetFormat,
        exif: Option<&[u8]>,
    ) -> Result<PathBuf, PipelineError> {
        let path = output_path(stem, format);
        let bytes = Self::encode(image, format, exif, &path)?;
        std::fs::write(&path, bytes).map_err(|source| PipelineError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// `stem` with the extension of `format` appended.
pub fn output_path(stem: &Path, format: TargetFormat) -> PathBuf {
    with_extension(stem, format.extension())
}

/// Append `.ext` to `stem` without replacing anything after an existing dot.
pub fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};

    fn translucent() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 6, Rgba([200, 10, 10, 128])))
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(
            output_path(Path::new("out/photo.v2"), TargetFormat::Jpeg),
            PathBuf::from("out/photo.v2.jpg")
        );
        assert_eq!(
            output_path(Path::new("out/photo"), TargetFormat::Webp),
            PathBuf::from("out/photo.webp")
        );
    }

    #[test]
    fn test_jpeg_drops_alpha() {
        let bytes = Encoder::encode(&translucent(), TargetFormat::Jpeg, None, Path::new("x"))
            .unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (10, 6));
    }

    #[test]
    fn test_png_and_webp_keep_alpha() {
        for (format, image_format) in [
            (TargetFormat::Png, ImageFormat::Png),
            (TargetFormat::Webp, ImageFormat::WebP),
        ] {
            let bytes = Encoder::encode(&translucent(), format, None, Path::new("x")).unwrap();
            let decoded = image::load_from_memory_with_format(&bytes, image_format).unwrap();
            assert!(decoded.color().has_alpha(), "{format} lost alpha");
            assert_eq!(decoded.to_rgba8().get_pixel(3, 3)[3], 128);
        }
    }

    #[test]
    fn test_webp_is_lossless() {
        let gradient = RgbaImage::from_fn(32, 16, |x, y| {
            Rgba([(x * 8) as u8, (y * 16) as u8, ((x + y) * 5) as u8, 255])
        });
        let source = DynamicImage::ImageRgba8(gradient.clone());
        let bytes = Encoder::encode(&source, TargetFormat::Webp, None, Path::new("x")).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.to_rgba8(), gradient);
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("result");
        let path = Encoder::save(&translucent(), &stem, TargetFormat::Png, None).unwrap();
        assert_eq!(path, dir.path().join("result.png"));
        assert!(path.is_file());
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("missing").join("result");
        let err = Encoder::save(&translucent(), &stem, TargetFormat::Png, None).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
