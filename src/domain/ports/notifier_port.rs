//! Desktop notification port definition.

/// Port for fire-and-forget desktop notifications.
pub trait NotifierPort: Send + Sync {
    /// Shows a notification; failures are logged, never surfaced.
    fn send(&self, title: &str, body: &str);
}
