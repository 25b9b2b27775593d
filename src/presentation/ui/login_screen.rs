//! Sign-in screen.
//!
//! The OAuth dance happens in the browser; this screen launches the entry
//! points and tells the user how to hand the resulting session cookie back
//! to the client.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tracing::warn;

/// The unauthenticated entry screen.
pub struct LoginScreen {
    google_url: String,
    github_url: String,
}

impl LoginScreen {
    /// Creates the screen over the service's OAuth entry points.
    #[must_use]
    pub const fn new(google_url: String, github_url: String) -> Self {
        Self { google_url, github_url }
    }

    /// Handles a key press; returns whether it was consumed.
    pub fn handle_key(&self, key: &KeyEvent) -> bool {
        let url = match key.code {
            KeyCode::Char('g') => &self.google_url,
            KeyCode::Char('h') => &self.github_url,
            _ => return false,
        };
        if let Err(e) = opener::open_browser(url) {
            warn!(error = %e, url = %url, "failed to open browser");
        }
        true
    }
}

impl Widget for &LoginScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Sign in ");
        let inner = block.inner(area);
        block.render(area, buf);

        let vertical = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Fill(1),
        ]);
        let [_, center, _] = vertical.areas(inner);

        let lines = vec![
            Line::from(Span::styled(
                "Not signed in",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press 'g' to sign in with Google"),
            Line::from("Press 'h' to sign in with GitHub"),
            Line::from(""),
            Line::from(Span::styled(
                "Then restart with the session cookie in $PICTOR_SESSION",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "'q' quits",
                Style::default().fg(Color::DarkGray),
            )),
        ];

        Paragraph::new(lines).centered().render(center, buf);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyEventKind, KeyModifiers};

    use super::*;

    #[test]
    fn test_unrelated_keys_are_not_consumed() {
        let screen = LoginScreen::new("http://s/auth/google/login".into(), "http://s/auth/github/login".into());
        let key = KeyEvent::new_with_kind(KeyCode::Char('x'), KeyModifiers::NONE, KeyEventKind::Press);
        assert!(!screen.handle_key(&key));
    }
}
