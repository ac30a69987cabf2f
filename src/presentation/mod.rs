//! Presentation layer: the browse screen and plain command output.

/// Subcommand handlers.
pub mod commands;
/// Key handling.
pub mod events;
/// Text formatting helpers.
pub mod format;
/// Color schemes.
pub mod theme;
/// UI screens.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use theme::Theme;
pub use ui::BrowseApp;
