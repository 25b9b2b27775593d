//! Event handling.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers};
use futures_util::StreamExt;

/// Asynchronous terminal event source.
pub struct EventHandler {
    stream: EventStream,
}

impl EventHandler {
    /// Creates a handler over the terminal's event stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stream: EventStream::new(),
        }
    }

    /// Waits for the next terminal event. `None` when the stream closes.
    pub async fn next(&mut self) -> Option<std::io::Result<Event>> {
        self.stream.next().await
    }

    /// Checks if key is a quit event.
    #[must_use]
    pub fn is_quit_event(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::NONE,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}
