//! Screen shown while the session is resolving.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Full-screen loading indicator. Protected content stays withheld until
/// the session guard resolves.
pub struct SplashScreen;

impl Widget for &SplashScreen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Pictor ");
        let inner = block.inner(area);
        block.render(area, buf);

        let vertical = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ]);
        let [_, center, _] = vertical.areas(inner);

        Paragraph::new(Line::from("Checking session..."))
            .centered()
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .render(center, buf);
    }
}
