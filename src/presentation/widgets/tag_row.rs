//! Tag row widget with overflow.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::presentation::layout::{
    ResizeHandle, TAG_GAP, TagFit, fit_tags, indicator_width, measure_chips,
};

const CHIP_COLORS: [Color; 6] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];

/// Stable per-label chip color.
fn chip_color(label: &str) -> Color {
    let mut hash: i32 = 0;
    for c in label.chars() {
        hash = (c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    CHIP_COLORS[hash.unsigned_abs() as usize % CHIP_COLORS.len()]
}

/// One image's tag chips, truncated to the container width with a "+N"
/// indicator for the rest.
///
/// Chips are measured once per tag set; the fit is recomputed only when the
/// subscribed container width actually changes. The resize subscription is
/// released when the row is dropped.
pub struct TagRow {
    labels: Vec<String>,
    widths: Vec<u16>,
    resize: ResizeHandle,
    fit: TagFit,
}

impl TagRow {
    /// Creates a row for `labels`, fitted to the container's current width.
    #[must_use]
    pub fn new(labels: Vec<String>, mut resize: ResizeHandle) -> Self {
        let widths = measure_chips(&labels);
        let container = resize.latest();
        let fit = Self::compute(&labels, &widths, container);
        Self { labels, widths, resize, fit }
    }

    /// Replaces the tag set, re-measuring and re-fitting.
    pub fn set_tags(&mut self, labels: Vec<String>) {
        self.widths = measure_chips(&labels);
        self.labels = labels;
        self.fit = Self::compute(&self.labels, &self.widths, self.resize.current());
    }

    /// Recomputes the fit when the container width changed since the last
    /// call. Returns whether anything changed.
    pub fn refresh(&mut self) -> bool {
        if !self.resize.changed() {
            return false;
        }
        let container = self.resize.latest();
        let fit = Self::compute(&self.labels, &self.widths, container);
        let moved = fit != self.fit;
        self.fit = fit;
        moved
    }

    /// Current fit.
    #[must_use]
    pub const fn fit(&self) -> TagFit {
        self.fit
    }

    /// Whether there are no tags at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn compute(labels: &[String], widths: &[u16], container: u16) -> TagFit {
        // Reserve for the widest indicator this tag set can need.
        let reserve = indicator_width(labels.len().saturating_sub(1));
        fit_tags(widths, TAG_GAP, reserve, container)
    }
}

impl Widget for &TagRow {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.labels.is_empty() {
            return;
        }

        let mut spans: Vec<Span> = Vec::new();
        for (i, label) in self.labels[..self.fit.visible].iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" ".repeat(usize::from(TAG_GAP))));
            }
            spans.push(Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::Black).bg(chip_color(label)),
            ));
        }
        if self.fit.has_indicator() {
            if self.fit.visible > 0 {
                spans.push(Span::raw(" ".repeat(usize::from(TAG_GAP))));
            }
            spans.push(Span::styled(
                format!("+{}", self.fit.hidden),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM),
            ));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::layout::ResizeNotifier;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| (*n).to_owned()).collect()
    }

    #[test]
    fn test_row_fits_to_initial_width() {
        let notifier = ResizeNotifier::new(40);
        let row = TagRow::new(labels(&["sky", "beach", "sunset"]), notifier.subscribe());
        assert_eq!(row.fit().visible, 3);
        assert!(!row.fit().has_indicator());
    }

    #[test]
    fn test_row_refits_on_resize_only() {
        let notifier = ResizeNotifier::new(40);
        let mut row = TagRow::new(labels(&["sky", "beach", "sunset"]), notifier.subscribe());

        // No change published: refresh is a no-op.
        assert!(!row.refresh());

        // Narrowing the container hides trailing tags behind the indicator.
        notifier.publish(9);
        assert!(row.refresh());
        assert!(row.fit().has_indicator());
        assert!(row.fit().visible < 3);

        notifier.publish(40);
        assert!(row.refresh());
        assert_eq!(row.fit().visible, 3);
    }

    #[test]
    fn test_tag_set_change_remeasures() {
        let notifier = ResizeNotifier::new(12);
        let mut row = TagRow::new(labels(&["a", "b"]), notifier.subscribe());
        assert_eq!(row.fit().visible, 2);

        row.set_tags(labels(&["a", "b", "an-extremely-long-tag"]));
        assert!(row.fit().has_indicator());
    }

    #[test]
    fn test_chip_color_is_stable() {
        assert_eq!(chip_color("sky"), chip_color("sky"));
    }

    #[test]
    fn test_render_shows_visible_chips_and_indicator() {
        let notifier = ResizeNotifier::new(10);
        let row = TagRow::new(labels(&["sky", "beach", "sunset"]), notifier.subscribe());

        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        (&row).render(area, &mut buf);

        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_owned())
            .collect();
        assert!(line.contains("sky"));
        assert!(line.contains('+'));
    }
}
