//! Pre-run validation of the batch paths.
//!
//! Every check here runs before any file is touched. A failure aborts the
//! whole run with a single message.

use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;

/// Extensions accepted for the watermark file.
const WATERMARK_EXTENSIONS: &[&str] = &["png", "webp"];

/// Validates the input, output and watermark paths of a batch.
pub struct Validator;

impl Validator {
    /// Check the three batch paths.
    ///
    /// - the input directory exists
    /// - the watermark is an existing PNG or WebP file (extension and signature)
    /// - the output directory is neither the input directory nor inside it
    pub fn validate_paths(input: &Path, output: &Path, watermark: &Path) -> Result<(), ConfigError> {
        if !input.is_dir() {
            return Err(ConfigError::InvalidPaths(format!(
                "Input directory does not exist: {}",
                input.display()
            )));
        }

        Self::validate_watermark(watermark)?;

        if Self::is_within(output, input)? {
            return Err(ConfigError::InvalidPaths(format!(
                "Output directory cannot be inside input directory: {} is within {}",
                output.display(),
                input.display()
            )));
        }

        Ok(())
    }

    /// Check that `path` is an alpha-capable image by extension and magic bytes.
    pub fn validate_watermark(path: &Path) -> Result<(), ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::InvalidPaths(format!(
                "Watermark file does not exist: {}",
                path.display()
            )));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !WATERMARK_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ConfigError::Watermark {
                path: path.to_path_buf(),
                message: "must be a PNG or WebP file".to_string(),
            });
        }

        let mut header = [0u8; 12];
        let bytes_read = std::fs::File::open(path)
            .and_then(|mut file| file.read(&mut header))
            .map_err(|e| ConfigError::Watermark {
                path: path.to_path_buf(),
                message: format!("cannot read file: {e}"),
            })?;

        if !Self::is_alpha_capable_header(&header, bytes_read) {
            return Err(ConfigError::Watermark {
                path: path.to_path_buf(),
                message: "file content is not PNG or WebP".to_string(),
            });
        }
        Ok(())
    }

    /// PNG (`89 50 4E 47`) or WebP (`RIFF....WEBP`).
    fn is_alpha_capable_header(header: &[u8; 12], bytes_read: usize) -> bool {
        if bytes_read >= 4 && header[..4] == [0x89, b'P', b'N', b'G'] {
            return true;
        }
        bytes_read >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP"
    }

    /// Whether `path` equals `base` or lies below it, after resolving both
    /// against the filesystem.
    pub fn is_within(path: &Path, base: &Path) -> Result<bool, ConfigError> {
        let base = resolve(base)?;
        let path = resolve(path)?;
        Ok(path.starts_with(&base))
    }
}

/// Canonicalize the longest existing ancestor of `path` and append the rest
/// lexically. Works for output directories that do not exist yet.
fn resolve(path: &Path) -> Result<PathBuf, ConfigError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut rest: Vec<Component<'_>> = Vec::new();
    loop {
        if existing.exists() {
            break;
        }
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(last)) => {
                rest.push(last);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize().unwrap_or_else(|_| existing.to_path_buf());
    for component in rest.into_iter().rev() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}
