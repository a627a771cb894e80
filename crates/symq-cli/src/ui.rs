use std::io::IsTerminal;

use crate::cli::{ColorMode, OutputFormat};

/// Whether text output should carry ANSI highlighting.
#[must_use]
pub fn color_enabled(mode: ColorMode, format: OutputFormat) -> bool {
    match mode {
        ColorMode::Always => format == OutputFormat::Text,
        ColorMode::Never => false,
        ColorMode::Auto => {
            format == OutputFormat::Text
                && std::io::stdout().is_terminal()
                && std::env::var_os("NO_COLOR").is_none()
        }
    }
}
