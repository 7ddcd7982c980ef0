//! The logo composited onto every image of a batch.

use image::RgbaImage;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::decode::ImageDecoder;
use super::validate::Validator;

/// A decoded watermark, normalised to RGBA8.
///
/// Decoded once per run and shared read-only between tasks; every task works
/// on its own scaled copy.
#[derive(Debug, Clone)]
pub struct Watermark {
    path: PathBuf,
    image: RgbaImage,
}

impl Watermark {
    /// Validate and decode a watermark file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Validator::validate_watermark(path)?;
        let decoded = ImageDecoder::decode(path).map_err(|e| ConfigError::Watermark {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(
            "Loaded watermark {:?} ({}x{})",
            path,
            decoded.width,
            decoded.height
        );
        Ok(Self::from_image(path, decoded.image.to_rgba8()))
    }

    /// Wrap an already decoded image.
    pub fn from_image(path: impl Into<PathBuf>, image: RgbaImage) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
