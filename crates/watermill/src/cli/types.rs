//! CLI enum types mapped onto the core configuration enums.

use clap::ValueEnum;
use watermill_core::{ConflictMode, OutputFormat, TargetFormat};

/// Primary output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Keep each file's own format (TIFF and BMP become PNG)
    Source,
    Jpeg,
    Png,
    Webp,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Source => OutputFormat::Source,
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Webp => OutputFormat::Webp,
        }
    }
}

/// Optional second output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExtraFormatArg {
    None,
    Jpeg,
    Png,
    Webp,
}

impl From<ExtraFormatArg> for Option<TargetFormat> {
    fn from(arg: ExtraFormatArg) -> Self {
        match arg {
            ExtraFormatArg::None => None,
            ExtraFormatArg::Jpeg => Some(TargetFormat::Jpeg),
            ExtraFormatArg::Png => Some(TargetFormat::Png),
            ExtraFormatArg::Webp => Some(TargetFormat::Webp),
        }
    }
}

/// What to do with outputs that already exist.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ConflictArg {
    /// Prompt once before the run (overwrites when there is no terminal)
    Ask,
    Overwrite,
    Skip,
}

impl From<ConflictArg> for ConflictMode {
    fn from(arg: ConflictArg) -> Self {
        match arg {
            ConflictArg::Ask => ConflictMode::Ask,
            ConflictArg::Overwrite => ConflictMode::Overwrite,
            ConflictArg::Skip => ConflictMode::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_none_maps_to_none() {
        let extra: Option<TargetFormat> = ExtraFormatArg::None.into();
        assert!(extra.is_none());
        let extra: Option<TargetFormat> = ExtraFormatArg::Webp.into();
        assert_eq!(extra, Some(TargetFormat::Webp));
    }

    #[test]
    fn test_value_names() {
        assert!(FormatArg::from_str("source", true).is_ok());
        assert!(FormatArg::from_str("JPEG", true).is_ok());
        assert!(ConflictArg::from_str("skip", false).is_ok());
        assert!(ExtraFormatArg::from_str("gif", true).is_err());
    }
}
