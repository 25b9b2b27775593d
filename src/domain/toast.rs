//! Toast notification entities.

use std::time::{Duration, Instant};

/// How long a toast stays visible unless dismissed earlier.
pub const TOAST_LIFETIME: Duration = Duration::from_millis(4000);

/// Identifier of one toast. Strictly increasing per queue instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToastId(pub u64);

/// Visual weight of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastSeverity {
    /// Completed action.
    Success,
    /// Failed action.
    Error,
    /// Neutral information.
    #[default]
    Info,
}

/// One time-boxed notification.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Queue-unique, monotonically increasing id.
    pub id: ToastId,
    /// Message shown to the user.
    pub text: String,
    /// Visual weight.
    pub severity: ToastSeverity,
    /// Creation time; expiry is scheduled [`TOAST_LIFETIME`] after this.
    pub created_at: Instant,
}

impl Toast {
    /// Creates a toast stamped with the current time.
    #[must_use]
    pub fn new(id: ToastId, severity: ToastSeverity, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            severity,
            created_at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity_is_info() {
        assert_eq!(ToastSeverity::default(), ToastSeverity::Info);
    }

    #[test]
    fn test_toast_ids_order() {
        assert!(ToastId(2) > ToastId(1));
    }
}
