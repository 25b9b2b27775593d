//! Container width change notifications.
//!
//! A [`ResizeNotifier`] broadcasts the current width of a layout container;
//! interested views hold a [`ResizeHandle`] subscription for their whole
//! lifetime and recompute when the width actually changed. The abstraction
//! is deliberately independent of any rendering framework: terminal resize
//! events feed it, but tests drive it directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;
use tracing::trace;

/// Broadcast source for a container's width.
pub struct ResizeNotifier {
    tx: watch::Sender<u16>,
    active: Arc<AtomicUsize>,
}

impl ResizeNotifier {
    /// Creates a notifier with the container's initial width.
    #[must_use]
    pub fn new(initial: u16) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publishes a new width. Subscribers only observe actual changes.
    pub fn publish(&self, width: u16) {
        self.tx.send_if_modified(|current| {
            if *current == width {
                false
            } else {
                trace!(width, "container width changed");
                *current = width;
                true
            }
        });
    }

    /// The most recently published width.
    #[must_use]
    pub fn current(&self) -> u16 {
        *self.tx.borrow()
    }

    /// Opens a live subscription. The handle must be dropped on view
    /// teardown; it is what keeps the subscription accounted for.
    #[must_use]
    pub fn subscribe(&self) -> ResizeHandle {
        self.active.fetch_add(1, Ordering::Relaxed);
        ResizeHandle {
            rx: self.tx.subscribe(),
            active: Arc::clone(&self.active),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// One view's live subscription to a [`ResizeNotifier`].
pub struct ResizeHandle {
    rx: watch::Receiver<u16>,
    active: Arc<AtomicUsize>,
}

impl ResizeHandle {
    /// Whether the width changed since the last [`Self::latest`] call.
    pub fn changed(&mut self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Current width, consuming the change flag.
    pub fn latest(&mut self) -> u16 {
        *self.rx.borrow_and_update()
    }

    /// Current width without consuming the change flag.
    #[must_use]
    pub fn current(&self) -> u16 {
        *self.rx.borrow()
    }
}

impl Drop for ResizeHandle {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_observe_width_changes() {
        let notifier = ResizeNotifier::new(80);
        let mut handle = notifier.subscribe();
        assert_eq!(handle.latest(), 80);
        assert!(!handle.changed());

        notifier.publish(120);
        assert!(handle.changed());
        assert_eq!(handle.latest(), 120);
        assert!(!handle.changed());
    }

    #[test]
    fn test_same_width_does_not_wake_subscribers() {
        let notifier = ResizeNotifier::new(80);
        let mut handle = notifier.subscribe();
        let _ = handle.latest();

        notifier.publish(80);
        assert!(!handle.changed());
    }

    #[test]
    fn test_dropping_the_handle_releases_the_subscription() {
        let notifier = ResizeNotifier::new(80);
        let first = notifier.subscribe();
        let second = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        drop(first);
        assert_eq!(notifier.subscriber_count(), 1);
        drop(second);
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
