//! Text input widget.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// What a key press did to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// The key was not meant for the input.
    Ignored,
    /// The value or cursor changed.
    Edited,
    /// Enter was pressed.
    Submitted,
    /// Escape was pressed.
    Cancelled,
}

/// Single-line text input with its own key handling.
#[derive(Debug, Clone)]
pub struct TextInput {
    // Chars rather than bytes so the cursor works on any script.
    value: Vec<char>,
    cursor: usize,
    label: String,
    placeholder: String,
}

impl TextInput {
    /// Creates an empty input titled `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            value: Vec::new(),
            cursor: 0,
            label: label.into(),
            placeholder: String::new(),
        }
    }

    /// Sets placeholder text.
    #[must_use]
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> String {
        self.value.iter().collect()
    }

    /// Whether the trimmed value is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.value.iter().all(|c| c.is_whitespace())
    }

    /// Replaces the value, placing the cursor at the end.
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().collect();
        self.cursor = self.value.len();
    }

    /// Clears the value.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Applies one key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> InputAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('u') => {
                    self.clear();
                    InputAction::Edited
                }
                KeyCode::Char('a') => {
                    self.cursor = 0;
                    InputAction::Edited
                }
                KeyCode::Char('e') => {
                    self.cursor = self.value.len();
                    InputAction::Edited
                }
                _ => InputAction::Ignored,
            };
        }

        match key.code {
            KeyCode::Enter => InputAction::Submitted,
            KeyCode::Esc => InputAction::Cancelled,
            KeyCode::Char(c) => {
                self.value.insert(self.cursor, c);
                self.cursor += 1;
                InputAction::Edited
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.value.remove(self.cursor);
                }
                InputAction::Edited
            }
            KeyCode::Delete => {
                if self.cursor < self.value.len() {
                    self.value.remove(self.cursor);
                }
                InputAction::Edited
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                InputAction::Edited
            }
            KeyCode::Right => {
                if self.cursor < self.value.len() {
                    self.cursor += 1;
                }
                InputAction::Edited
            }
            KeyCode::Home => {
                self.cursor = 0;
                InputAction::Edited
            }
            KeyCode::End => {
                self.cursor = self.value.len();
                InputAction::Edited
            }
            _ => InputAction::Ignored,
        }
    }
}

impl Widget for &TextInput {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let value = self.value();
        let (display, text_style) = if value.is_empty() {
            (self.placeholder.clone(), Style::default().fg(Color::DarkGray))
        } else {
            (value, Style::default().fg(Color::White))
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(self.label.as_str());
        let inner = block.inner(area);

        block.render(area, buf);
        Paragraph::new(display).style(text_style).render(inner, buf);

        if inner.width > 0 {
            let before: String = self.value[..self.cursor].iter().collect();
            let offset = u16::try_from(before.width()).unwrap_or(u16::MAX);
            let cursor_x = inner.x.saturating_add(offset);
            if cursor_x < inner.x + inner.width {
                buf[(cursor_x, inner.y)]
                    .set_style(Style::default().bg(Color::White).fg(Color::Black));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventKind;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new_with_kind(KeyCode::Char(c), KeyModifiers::CONTROL, KeyEventKind::Press)
    }

    #[test]
    fn test_typing_and_deleting() {
        let mut input = TextInput::new("Search");
        assert_eq!(input.handle_key(&press(KeyCode::Char('a'))), InputAction::Edited);
        input.handle_key(&press(KeyCode::Char('b')));
        assert_eq!(input.value(), "ab");

        input.handle_key(&press(KeyCode::Backspace));
        assert_eq!(input.value(), "a");
    }

    #[test]
    fn test_cursor_works_on_multibyte_text() {
        let mut input = TextInput::new("Search");
        input.set_value("日本");
        input.handle_key(&press(KeyCode::Left));
        input.handle_key(&press(KeyCode::Char('の')));
        assert_eq!(input.value(), "日の本");
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut input = TextInput::new("Search");
        assert_eq!(input.handle_key(&press(KeyCode::Enter)), InputAction::Submitted);
        assert_eq!(input.handle_key(&press(KeyCode::Esc)), InputAction::Cancelled);
    }

    #[test]
    fn test_ctrl_u_clears() {
        let mut input = TextInput::new("Search");
        input.set_value("sunset");
        assert_eq!(input.handle_key(&ctrl('u')), InputAction::Edited);
        assert!(input.is_blank());
    }

    #[test]
    fn test_blankness_ignores_whitespace() {
        let mut input = TextInput::new("Search");
        input.set_value("   ");
        assert!(input.is_blank());
        input.set_value("  x ");
        assert!(!input.is_blank());
    }
}
