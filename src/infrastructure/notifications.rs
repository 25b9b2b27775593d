//! System notifications with conditional compilation.

use crate::domain::ports::NotifierPort;

/// Desktop notification service.
#[cfg(feature = "notify")]
mod notify_impl {
    use super::NotifierPort;
    use notify_rust::Notification;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotifier {
        enabled: bool,
    }

    impl DesktopNotifier {
        #[must_use]
        pub const fn new(enabled: bool) -> Self {
            Self { enabled }
        }
    }

    impl NotifierPort for DesktopNotifier {
        fn send(&self, title: &str, body: &str) {
            if !self.enabled {
                return;
            }

            let title = title.to_string();
            let body = body.to_string();

            tokio::task::spawn_blocking(move || {
                if let Err(e) = Notification::new()
                    .summary(&title)
                    .body(&body)
                    .appname("Pictor")
                    .show()
                {
                    tracing::warn!("Failed to show notification: {}", e);
                }
            });
        }
    }
}

/// Stub notification service when the notify feature is disabled.
#[cfg(not(feature = "notify"))]
mod stub_impl {
    use super::NotifierPort;

    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotifier {
        _enabled: bool,
    }

    impl DesktopNotifier {
        #[must_use]
        pub const fn new(_enabled: bool) -> Self {
            Self { _enabled: false }
        }
    }

    impl NotifierPort for DesktopNotifier {
        fn send(&self, _title: &str, _body: &str) {
            // Notifications disabled - do nothing
        }
    }
}

#[cfg(feature = "notify")]
pub use notify_impl::DesktopNotifier;
#[cfg(not(feature = "notify"))]
pub use stub_impl::DesktopNotifier;
