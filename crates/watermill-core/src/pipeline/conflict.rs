//! Detection and resolution of outputs that already exist.

use std::path::Path;

use crate::config::{ConflictMode, OutputFormat, TargetFormat};

use super::encode::with_extension;

/// Extensions checked when the output keeps the source format, since the
/// stem alone does not say which one will be written.
const SOURCE_MODE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// What to do with a file whose outputs may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Write,
    Skip,
}

/// Stateless conflict checks.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Whether any output for `stem` is already on disk.
    pub fn exists(stem: &Path, primary: OutputFormat, extra: Option<TargetFormat>) -> bool {
        let primary_hit = match primary.target() {
            Some(format) => with_extension(stem, format.extension()).exists(),
            None => SOURCE_MODE_EXTENSIONS
                .iter()
                .any(|ext| with_extension(stem, ext).exists()),
        };
        primary_hit || extra.is_some_and(|format| with_extension(stem, format.extension()).exists())
    }

    /// Decide whether to write. `Ask` writes: the prompt, when there is one,
    /// happens in the front end before the run starts.
    pub fn resolve(mode: ConflictMode, exists: bool) -> ConflictAction {
        match mode {
            ConflictMode::Skip if exists => ConflictAction::Skip,
            _ => ConflictAction::Write,
        }
    }

    /// Combined check for a stem.
    pub fn check(
        stem: &Path,
        mode: ConflictMode,
        primary: OutputFormat,
        extra: Option<TargetFormat>,
    ) -> ConflictAction {
        if mode != ConflictMode::Skip {
            return ConflictAction::Write;
        }
        Self::resolve(mode, Self::exists(stem, primary, extra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_table() {
        assert_eq!(ConflictResolver::resolve(ConflictMode::Skip, true), ConflictAction::Skip);
        assert_eq!(ConflictResolver::resolve(ConflictMode::Skip, false), ConflictAction::Write);
        assert_eq!(ConflictResolver::resolve(ConflictMode::Overwrite, true), ConflictAction::Write);
        assert_eq!(ConflictResolver::resolve(ConflictMode::Ask, true), ConflictAction::Write);
    }

    #[test]
    fn test_exists_explicit_format() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("photo");
        std::fs::write(dir.path().join("photo.png"), b"x").unwrap();

        assert!(ConflictResolver::exists(&stem, OutputFormat::Png, None));
        assert!(!ConflictResolver::exists(&stem, OutputFormat::Jpeg, None));
        assert!(ConflictResolver::exists(&stem, OutputFormat::Jpeg, Some(TargetFormat::Png)));
    }

    #[test]
    fn test_exists_source_mode_checks_all() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("scan");
        assert!(!ConflictResolver::exists(&stem, OutputFormat::Source, None));

        std::fs::write(dir.path().join("scan.jpeg"), b"x").unwrap();
        assert!(ConflictResolver::exists(&stem, OutputFormat::Source, None));
    }

    #[test]
    fn test_check_only_looks_in_skip_mode() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("a");
        std::fs::write(dir.path().join("a.webp"), b"x").unwrap();

        let action = ConflictResolver::check(&stem, ConflictMode::Skip, OutputFormat::Webp, None);
        assert_eq!(action, ConflictAction::Skip);
        let action = ConflictResolver::check(&stem, ConflictMode::Overwrite, OutputFormat::Webp, None);
        assert_eq!(action, ConflictAction::Write);
    }
}
