//! Terminal output.
//!
//! ```text
//! commands ──▶ ConsoleReporter (progress, phases; stderr)
//!          ──▶ render          (tables, JSON; stdout)
//!                   │
//!                   ▼
//!                 Theme         (colors, icons, --no-color)
//! ```

pub mod render;
pub mod reporter;
pub mod theme;

pub use reporter::ConsoleReporter;
pub use theme::Theme;
