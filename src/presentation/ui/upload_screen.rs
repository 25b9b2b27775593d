//! Upload queue screen.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::application::toasts::ToastQueue;
use crate::application::upload::UploadPipeline;
use crate::domain::entities::UploadStatus;
use crate::presentation::widgets::{InputAction, StatusBar, StatusLevel, TextInput};

/// What the app should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Nothing further.
    Handled,
    /// Return to the gallery.
    Back,
    /// Quit the application.
    Quit,
}

const fn status_glyph(status: UploadStatus) -> &'static str {
    match status {
        UploadStatus::Pending => "·",
        UploadStatus::Uploading => "⏳",
        UploadStatus::Done => "✓",
        UploadStatus::Error => "✗",
    }
}

const fn status_color(status: UploadStatus) -> Color {
    match status {
        UploadStatus::Pending => Color::DarkGray,
        UploadStatus::Uploading => Color::Yellow,
        UploadStatus::Done => Color::Green,
        UploadStatus::Error => Color::Red,
    }
}

/// The upload queue view: a path prompt on top, the queue below.
pub struct UploadScreen {
    pipeline: UploadPipeline,
    toasts: ToastQueue,
    path_input: TextInput,
    input_focused: bool,
    selected: usize,
}

impl UploadScreen {
    /// Creates the screen over the shared pipeline.
    #[must_use]
    pub fn new(pipeline: UploadPipeline, toasts: ToastQueue) -> Self {
        Self {
            pipeline,
            toasts,
            path_input: TextInput::new(" Add file ").placeholder("/path/to/image.png"),
            input_focused: true,
            selected: 0,
        }
    }

    /// Handles a key press.
    pub fn handle_key(&mut self, key: &KeyEvent) -> UploadOutcome {
        if key.code == KeyCode::Tab {
            self.input_focused = !self.input_focused;
            return UploadOutcome::Handled;
        }

        if self.input_focused {
            match self.path_input.handle_key(key) {
                InputAction::Submitted => {
                    if !self.path_input.is_blank() {
                        let path = PathBuf::from(self.path_input.value().trim());
                        self.path_input.clear();
                        self.enqueue(path);
                    }
                }
                InputAction::Cancelled => return UploadOutcome::Back,
                _ => {}
            }
            return UploadOutcome::Handled;
        }

        match key.code {
            KeyCode::Char('q') => return UploadOutcome::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return UploadOutcome::Quit;
            }
            KeyCode::Char('b') | KeyCode::Esc => return UploadOutcome::Back,

            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.pipeline.items().len();
                if len > 0 && self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),

            KeyCode::Char('r') | KeyCode::Enter => self.start_run(),
            KeyCode::Char('d') => self.remove_selected(),
            KeyCode::Char('c') => {
                if let Err(e) = self.pipeline.clear() {
                    self.toasts.error(e.to_string());
                }
            }
            _ => {}
        }
        UploadOutcome::Handled
    }

    /// Stages one file into the queue.
    pub fn enqueue(&self, path: PathBuf) {
        let pipeline = self.pipeline.clone();
        let toasts = self.toasts.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.enqueue_file(&path).await {
                toasts.error(e.to_string());
            }
        });
    }

    fn start_run(&self) {
        let pipeline = self.pipeline.clone();
        // The pipeline reports completion itself; a second trigger while a
        // run is active comes back as a no-op.
        tokio::spawn(async move {
            let _ = pipeline.run().await;
        });
    }

    fn remove_selected(&mut self) {
        let items = self.pipeline.items();
        let Some(item) = items.get(self.selected) else {
            return;
        };
        if let Err(e) = self.pipeline.remove(item.id) {
            self.toasts.error(e.to_string());
        } else if self.selected > 0 {
            self.selected -= 1;
        }
    }

    /// Renders the screen.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ]);
        let [input_area, list_area, status_area] = layout.areas(area);

        frame.render_widget(&self.path_input, input_area);

        let items = self.pipeline.items();
        if items.is_empty() {
            let hint = Paragraph::new("Queue is empty. Enter a file path above.")
                .centered()
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(hint, list_area);
        } else {
            for (i, item) in items.iter().take(usize::from(list_area.height)).enumerate() {
                let row = Rect::new(
                    list_area.x,
                    list_area.y + u16::try_from(i).unwrap_or(0),
                    list_area.width,
                    1,
                );
                let marker = if !self.input_focused && i == self.selected { "▶" } else { " " };
                let kib = item.size_bytes / 1024;

                let mut spans = vec![
                    Span::raw(format!("{marker} ")),
                    Span::styled(
                        status_glyph(item.status),
                        Style::default().fg(status_color(item.status)),
                    ),
                    Span::raw(format!(" {} ({kib} KB)", item.file_name)),
                ];
                if let Some(error) = &item.error {
                    spans.push(Span::styled(
                        format!("  {error}"),
                        Style::default().fg(Color::Red),
                    ));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), row);
            }
        }

        let eligible = self.pipeline.eligible_count();
        let message = if self.pipeline.is_running() {
            "Uploading...".to_owned()
        } else if eligible > 0 {
            format!("{eligible} file(s) ready")
        } else {
            String::new()
        };
        let bar = StatusBar::new()
            .message(message)
            .hints("Tab focus  r run  d remove  c clear  b back")
            .level(if self.pipeline.is_running() {
                StatusLevel::Warning
            } else {
                StatusLevel::Info
            });
        frame.render_widget(&bar, status_area);
    }
}
