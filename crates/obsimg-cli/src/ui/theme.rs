//! UI Theme - colors, icons and formatting helpers
//!
//! All styling goes through [`Theme::paint`] so `--no-color` turns it off in
//! one place.

use crossterm::style::{Color, Stylize};

/// Colors and icons for console output.
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
    /// Emit plain text without ANSI styling.
    pub no_color: bool,
}

impl Theme {
    pub fn new(no_color: bool) -> Self {
        Self {
            colors: ColorScheme::default(),
            icons: Icons::default(),
            no_color,
        }
    }

    /// `text` in `color`, or unchanged when color is disabled.
    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.with(color).to_string()
        }
    }

    /// Bold `text`, or unchanged when color is disabled.
    pub fn bold(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(false)
    }
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Package names
    pub package_name: Color,
    /// Versions and releases
    pub version: Color,
    /// Secondary info (sizes, licenses)
    pub secondary: Color,
    /// Section headers
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            package_name: Color::Cyan,
            version: Color::White,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Icons {
    pub active: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

/// A `width`-character bar using ▓ (filled) and ░ (empty).
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total > 0 {
        (((current as f64 / total as f64) * width as f64).round() as usize).min(width)
    } else {
        0
    };
    format!("{}{}", "▓".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024 * 5), "5.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(format_progress_bar(512, 1024, 4), "▓▓░░");
        assert_eq!(format_progress_bar(2048, 1024, 4), "▓▓▓▓");
        assert_eq!(format_progress_bar(10, 0, 3), "░░░");
    }

    #[test]
    fn test_no_color_is_plain() {
        let theme = Theme::new(true);
        assert_eq!(theme.paint("bash", theme.colors.package_name), "bash");
        assert_eq!(theme.bold("bash"), "bash");
    }
}
