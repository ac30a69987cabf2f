//! Terminal color schemes.

use ratatui::style::{Color, Modifier, Style};

use crate::infrastructure::config::ThemeMode;

/// Styles used by the browse screen.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Highlight color for headers and the active sort.
    pub accent: Color,
    /// Style of the selected row.
    pub selection_style: Style,
    /// Style of secondary text.
    pub dimmed_style: Style,
    /// Style of regular text.
    pub base_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_mode(ThemeMode::Dark)
    }
}

impl Theme {
    /// Builds the scheme for `mode`. `Auto` uses the terminal's own colors.
    #[must_use]
    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self {
                accent: Color::Yellow,
                selection_style: Style::default().bg(Color::Rgb(60, 56, 30)).fg(Color::White),
                dimmed_style: Style::default().fg(Color::DarkGray),
                base_style: Style::default().fg(Color::Reset),
            },
            ThemeMode::Light => Self {
                accent: Color::Blue,
                selection_style: Style::default()
                    .bg(Color::Rgb(210, 225, 250))
                    .fg(Color::Black),
                dimmed_style: Style::default().fg(Color::Gray),
                base_style: Style::default().fg(Color::Black),
            },
            ThemeMode::Auto => Self {
                accent: Color::Cyan,
                selection_style: Style::default().add_modifier(Modifier::REVERSED),
                dimmed_style: Style::default().add_modifier(Modifier::DIM),
                base_style: Style::default(),
            },
        }
    }

    /// Style of header cells.
    #[must_use]
    pub fn header_style(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }
}
