//! Dialoguer theme and console styles for Watermill's terminal output.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns a `ColorfulTheme` configured with Watermill's colors.
///
/// Everything renders to stderr so stdout stays usable for `--json`.
pub fn watermill_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().cyan(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Style for section headings in summaries.
pub fn heading() -> Style {
    Style::new().for_stderr().cyan().bold()
}

/// Style for counts that need attention.
pub fn warning() -> Style {
    Style::new().for_stderr().yellow()
}
