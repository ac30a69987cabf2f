//! Status bar widget.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Severity of the message on the left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusLevel {
    /// Informational.
    #[default]
    Info,
    /// Success.
    Success,
    /// Warning, also used while showing sample data.
    Warning,
    /// Error.
    Error,
}

impl StatusLevel {
    /// Foreground color for the message.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

/// One-line bar: a status message on the left, key hints on the right.
///
/// Hints are hidden when the message would not fit next to them.
#[derive(Debug, Clone, Default)]
pub struct StatusBar {
    message: String,
    hints: String,
    level: StatusLevel,
}

impl StatusBar {
    /// Bar showing `message` at `level`.
    #[must_use]
    pub fn new(message: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            message: message.into(),
            hints: String::new(),
            level,
        }
    }

    /// Informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Info)
    }

    /// Success message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Success)
    }

    /// Warning message.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Warning)
    }

    /// Error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, StatusLevel::Error)
    }

    /// Sets the right-aligned key hints.
    #[must_use]
    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = hints.into();
        self
    }

    /// Severity of the message.
    #[must_use]
    pub const fn status_level(&self) -> StatusLevel {
        self.level
    }

    /// Message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Widget for &StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let message_style = Style::default()
            .fg(self.status_level().color())
            .add_modifier(Modifier::BOLD);
        let message = Paragraph::new(self.message.as_str()).style(message_style);

        let message_width = self.message.width();
        let hints_width = self.hints.width();
        let fits = message_width + hints_width < usize::from(area.width);
        if self.hints.is_empty() || !fits {
            message.render(area, buf);
            return;
        }

        let hints_width = u16::try_from(hints_width).unwrap_or(area.width);
        let [message_area, hints_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(hints_width)]).areas(area);
        message.render(message_area, buf);
        Paragraph::new(self.hints.as_str())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Right)
            .render(hints_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(bar: &StatusBar, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_hints_are_flush_right() {
        let bar = StatusBar::info("ok").hints("q quit");
        let line = rendered(&bar, 20);

        assert!(line.starts_with("ok"));
        assert!(line.ends_with("q quit"));
    }

    #[test]
    fn test_hints_yield_to_long_message() {
        let bar = StatusBar::error("upload failed: file too large").hints("q quit");
        let line = rendered(&bar, 24);

        assert!(line.starts_with("upload failed"));
        assert!(!line.contains("quit"));
    }

    #[test]
    fn test_levels() {
        assert_eq!(StatusBar::default().status_level(), StatusLevel::Info);
        assert_eq!(StatusBar::success("done").status_level(), StatusLevel::Success);
        assert_eq!(StatusLevel::Warning.color(), Color::Yellow);
    }
}
