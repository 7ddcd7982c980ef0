//! File discovery for finding images in directories.

use image::GenericImageView;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use crate::types::ImageAsset;

/// Extensions that are decoded and watermarked.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff", "bmp"];

/// Image extensions that are recognized but deliberately not processed.
/// Files with these extensions count as ignored.
pub const KNOWN_UNSUPPORTED_EXTENSIONS: &[&str] = &["avif", "heic", "gif", "tga", "pcx"];

/// Discovers image files in directories.
pub struct FileDiscovery {
    config: DiscoveryConfig,
}

/// Result of scanning a directory.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Usable images, in traversal order
    pub assets: Vec<ImageAsset>,
    /// Files that were rejected: corrupt, or a known unsupported format
    pub ignored: usize,
    /// Enumeration stopped at the batch size ceiling
    pub truncated: bool,
}

enum Candidate {
    Supported,
    KnownUnsupported,
    Other,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Scan with the configured recursion settings.
    pub fn discover(&self, directory: &Path) -> Discovery {
        self.find(directory, self.config.max_depth, self.config.recursive)
    }

    /// Find every usable image under `directory`.
    ///
    /// Recursive mode descends at most `max_depth` levels (direct children are
    /// level 1); otherwise only direct children are inspected. A file is kept
    /// only if its extension is supported and the whole file decodes. Returns an
    /// empty result when `directory` is not an existing directory.
    pub fn find(&self, directory: &Path, max_depth: usize, recursive: bool) -> Discovery {
        let mut found = Discovery::default();
        if !directory.is_dir() {
            return found;
        }

        let depth = if recursive { max_depth.max(1) } else { 1 };
        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(depth)
            .follow_links(true);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match Self::classify(path) {
                Candidate::Supported => match Self::inspect(path) {
                    Some(asset) => found.assets.push(asset),
                    None => {
                        tracing::debug!("Ignoring undecodable image: {:?}", path);
                        found.ignored += 1;
                    }
                },
                Candidate::KnownUnsupported => found.ignored += 1,
                Candidate::Other => {}
            }

            if found.assets.len() >= self.config.max_batch_size {
                tracing::warn!(
                    "Reached maximum batch size of {} files, remaining files are not included",
                    self.config.max_batch_size
                );
                found.truncated = true;
                break;
            }
        }

        found
    }

    /// Check a file's extension against the supported and known-unsupported sets.
    fn classify(path: &Path) -> Candidate {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Candidate::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            Candidate::Supported
        } else if KNOWN_UNSUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            Candidate::KnownUnsupported
        } else {
            Candidate::Other
        }
    }

    /// Sniff the format and decode the whole file. A readable header is not
    /// enough: truncated pixel data must be caught here, not mid-run.
    fn inspect(path: &Path) -> Option<ImageAsset> {
        let reader = image::ImageReader::open(path).ok()?.with_guessed_format().ok()?;
        let format = reader.format()?;
        let (width, height) = reader.decode().ok()?.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        Some(ImageAsset {
            path: path.to_path_buf(),
            format,
            width,
            height,
        })
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(path: &Path) -> bool {
        matches!(Self::classify(path), Candidate::Supported)
    }
}
