//! Toast stack widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::domain::{Toast, ToastSeverity};

const MAX_POPUP_WIDTH: u16 = 44;
const POPUP_HEIGHT: u16 = 3;

const fn severity_color(severity: ToastSeverity) -> Color {
    match severity {
        ToastSeverity::Success => Color::Green,
        ToastSeverity::Error => Color::Red,
        ToastSeverity::Info => Color::Cyan,
    }
}

/// Renders live toasts stacked in the bottom-right corner, newest at the
/// bottom. Toasts that do not fit vertically are simply not drawn; they
/// reappear as older ones expire.
pub struct ToastStack<'a> {
    toasts: &'a [Toast],
}

impl<'a> ToastStack<'a> {
    /// Creates the widget over the queue's visible toasts.
    #[must_use]
    pub const fn new(toasts: &'a [Toast]) -> Self {
        Self { toasts }
    }
}

impl Widget for ToastStack<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.toasts.is_empty() {
            return;
        }

        let slots = usize::from(area.height / POPUP_HEIGHT);
        if slots == 0 {
            return;
        }
        let shown = &self.toasts[self.toasts.len().saturating_sub(slots)..];

        let mut bottom = area.bottom();
        for toast in shown.iter().rev() {
            let text_width = u16::try_from(toast.text.width()).unwrap_or(u16::MAX);
            let width = text_width
                .saturating_add(4)
                .min(MAX_POPUP_WIDTH)
                .min(area.width);
            if width < 5 || bottom < area.y + POPUP_HEIGHT {
                break;
            }

            let popup = Rect::new(
                area.right().saturating_sub(width + 1),
                bottom - POPUP_HEIGHT,
                width,
                POPUP_HEIGHT,
            );
            let intersection = area.intersection(popup);
            if intersection.area() == 0 {
                break;
            }

            let color = severity_color(toast.severity);
            let block = Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(color));
            let para = Paragraph::new(toast.text.as_str())
                .block(block)
                .wrap(Wrap { trim: true })
                .style(Style::default().add_modifier(Modifier::BOLD));

            Clear.render(intersection, buf);
            para.render(intersection, buf);

            bottom -= POPUP_HEIGHT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ToastId;

    fn toast(id: u64, text: &str) -> Toast {
        Toast::new(ToastId(id), ToastSeverity::Success, text)
    }

    #[test]
    fn test_renders_newest_toasts_at_the_bottom() {
        let toasts = vec![toast(1, "older"), toast(2, "newer")];
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);

        ToastStack::new(&toasts).render(area, &mut buf);

        let row_text = |y: u16| -> String {
            (0..area.width).map(|x| buf[(x, y)].symbol().to_owned()).collect()
        };
        // Newest occupies the bottom slot, older the one above.
        assert!(row_text(10).contains("newer"));
        assert!(row_text(7).contains("older"));
    }

    #[test]
    fn test_empty_queue_draws_nothing() {
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        ToastStack::new(&[]).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
