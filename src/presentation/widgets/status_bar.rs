//! Status bar widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Tone of the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    /// Informational.
    #[default]
    Info,
    /// Completed action.
    Success,
    /// Something needs attention.
    Warning,
    /// Failed action.
    Error,
}

impl StatusLevel {
    /// Returns the color for this level.
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

/// One-line bar: a leveled message on the left, dimmed key hints on the
/// right.
#[derive(Debug, Clone, Default)]
pub struct StatusBar {
    message: String,
    hints: String,
    level: StatusLevel,
}

impl StatusBar {
    /// Creates an empty bar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the right-aligned key hints.
    #[must_use]
    pub fn hints(mut self, hints: impl Into<String>) -> Self {
        self.hints = hints.into();
        self
    }

    /// Sets the message level.
    #[must_use]
    pub const fn level(mut self, level: StatusLevel) -> Self {
        self.level = level;
        self
    }
}

impl Widget for &StatusBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = usize::from(area.width);
        let message_width = self.message.width();
        let hints_width = self.hints.width();

        let padding = width.saturating_sub(message_width + hints_width);

        let mut spans = vec![Span::styled(
            self.message.as_str(),
            Style::default()
                .fg(self.level.color())
                .add_modifier(Modifier::BOLD),
        )];
        if padding > 0 {
            spans.push(Span::raw(" ".repeat(padding)));
        }
        if !self.hints.is_empty() {
            spans.push(Span::styled(
                self.hints.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_are_right_aligned() {
        let bar = StatusBar::new().message("12 images").hints("q quit");
        let area = Rect::new(0, 0, 24, 1);
        let mut buf = Buffer::empty(area);
        (&bar).render(area, &mut buf);

        let line: String = (0..area.width).map(|x| buf[(x, 0)].symbol().to_owned()).collect();
        assert!(line.starts_with("12 images"));
        assert!(line.ends_with("q quit"));
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(StatusLevel::Error.color(), Color::Red);
        assert_eq!(StatusLevel::default().color(), Color::Cyan);
    }
}
