//! Time-boxed toast notifications.
//!
//! The queue is the sole user-visible error surface. Every toast schedules
//! its own removal [`TOAST_LIFETIME`](crate::domain::TOAST_LIFETIME) after
//! creation; dismissing one earlier never disturbs the timers of the others.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::domain::{TOAST_LIFETIME, Toast, ToastId, ToastSeverity};

struct QueueInner {
    toasts: Mutex<Vec<Toast>>,
    // Owned by the instance so independent queues never share id space.
    seq: AtomicU64,
    revision: watch::Sender<u64>,
}

/// Append-only list of live toasts.
///
/// Cheap to clone; clones share the same queue.
pub struct ToastQueue {
    inner: Arc<QueueInner>,
}

impl Clone for ToastQueue {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ToastQueue {
    /// Creates an empty queue with its own id sequence.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(QueueInner {
                toasts: Mutex::new(Vec::new()),
                seq: AtomicU64::new(0),
                revision,
            }),
        }
    }

    /// Appends a toast and schedules its expiry.
    pub fn push(&self, severity: ToastSeverity, text: impl Into<String>) -> ToastId {
        let id = ToastId(self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1);
        self.inner.toasts.lock().push(Toast::new(id, severity, text));
        self.bump();

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_LIFETIME).await;
            queue.dismiss(id);
        });

        id
    }

    /// Appends a success toast.
    pub fn success(&self, text: impl Into<String>) -> ToastId {
        self.push(ToastSeverity::Success, text)
    }

    /// Appends an error toast.
    pub fn error(&self, text: impl Into<String>) -> ToastId {
        self.push(ToastSeverity::Error, text)
    }

    /// Appends an info toast.
    pub fn info(&self, text: impl Into<String>) -> ToastId {
        self.push(ToastSeverity::Info, text)
    }

    /// Removes a toast by id. Removing an expired or unknown id is a no-op.
    pub fn dismiss(&self, id: ToastId) {
        let removed = {
            let mut toasts = self.inner.toasts.lock();
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            toasts.len() != before
        };
        if removed {
            trace!(id = id.0, "toast dismissed");
            self.bump();
        }
    }

    /// Live toasts in creation order.
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.inner.toasts.lock().clone()
    }

    /// Whether any toast is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.toasts.lock().is_empty()
    }

    /// Receiver that ticks on every queue change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_toast_expires_after_lifetime() {
        let queue = ToastQueue::new();
        queue.push(ToastSeverity::default(), "saved");
        assert_eq!(queue.visible().len(), 1);

        // Just before the deadline it is still there.
        tokio::time::sleep(TOAST_LIFETIME - Duration::from_millis(1)).await;
        assert_eq!(queue.visible().len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_dismiss_is_idempotent() {
        let queue = ToastQueue::new();
        let id = queue.info("copied");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        queue.dismiss(id);
        assert!(queue.is_empty());

        // Dismissing again, and the expiry timer firing later, are no-ops.
        queue.dismiss(id);
        tokio::time::sleep(TOAST_LIFETIME).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_leaves_other_timers_alone() {
        let queue = ToastQueue::new();
        let first = queue.info("one");

        tokio::time::sleep(Duration::from_millis(2000)).await;
        let _second = queue.info("two");
        queue.dismiss(first);

        // The second toast still has its full lifetime ahead.
        tokio::time::sleep(TOAST_LIFETIME - Duration::from_millis(1)).await;
        assert_eq!(queue.visible().len(), 1);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_increase_within_a_queue() {
        let queue = ToastQueue::new();
        let a = queue.info("a");
        let b = queue.error("b");
        let c = queue.success("c");
        assert!(a < b && b < c);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_queues_have_independent_sequences() {
        let left = ToastQueue::new();
        let right = ToastQueue::new();

        let l = left.info("l");
        let r = right.info("r");
        assert_eq!(l, ToastId(1));
        assert_eq!(r, ToastId(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_revision_ticks_on_changes() {
        let queue = ToastQueue::new();
        let mut rx = queue.watch();
        let seen = *rx.borrow_and_update();

        let id = queue.info("hello");
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update() > seen);

        queue.dismiss(id);
        assert!(rx.has_changed().unwrap());
    }
}
