//! Sequential upload pipeline.
//!
//! Files are staged into spool files at enqueue time and transferred
//! strictly in insertion order, one at a time. A run operates on the
//! snapshot of eligible (pending or failed) items taken when it starts;
//! triggering a run while one is active is a no-op. Item status changes are
//! published immediately, so progress stays visible while the queue drains.
//! After a full pass the pipeline invalidates the default first-page
//! listing exactly once and emits one aggregate completion notification.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::queries::PageCache;
use super::toasts::ToastQueue;
use crate::domain::entities::{SpoolFile, UploadItem, UploadItemId, UploadItemView, UploadStatus};
use crate::domain::errors::UploadError;
use crate::domain::ports::{CatalogPort, NotifierPort};
use crate::domain::query::QueryKey;

/// File extensions accepted into the queue.
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff"];

/// Result of triggering the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pass finished; per-item counts of the batch.
    Completed {
        /// Items that uploaded successfully.
        done: usize,
        /// Items that failed and stay eligible for the next run.
        failed: usize,
    },
    /// Another run is active; nothing was started.
    AlreadyRunning,
    /// No eligible items; nothing was started.
    Empty,
}

struct QueueState {
    items: Vec<UploadItem>,
    running: bool,
}

struct PipelineInner {
    catalog: Arc<dyn CatalogPort>,
    pages: PageCache,
    toasts: ToastQueue,
    notifier: Arc<dyn NotifierPort>,
    state: Mutex<QueueState>,
    revision: watch::Sender<u64>,
    seq: AtomicU64,
}

/// The upload queue and its single worker.
///
/// Cheap to clone; clones share the same queue.
pub struct UploadPipeline {
    inner: Arc<PipelineInner>,
}

impl Clone for UploadPipeline {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl UploadPipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        pages: PageCache,
        toasts: ToastQueue,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(PipelineInner {
                catalog,
                pages,
                toasts,
                notifier,
                state: Mutex::new(QueueState { items: Vec::new(), running: false }),
                revision,
                seq: AtomicU64::new(0),
            }),
        }
    }

    /// Stages `path` into a spool file and appends it to the queue.
    ///
    /// The same source file may be enqueued repeatedly; every call yields a
    /// distinct item.
    ///
    /// # Errors
    /// Rejects files without an image extension and fails when staging the
    /// copy fails.
    pub async fn enqueue_file(&self, path: &Path) -> Result<UploadItemId, UploadError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadError::NotAnImage { name: file_name });
        }

        let spool = tokio::task::spawn_blocking(NamedTempFile::new)
            .await
            .map_err(|e| UploadError::Stage(std::io::Error::other(e)))??;
        let size_bytes = tokio::fs::copy(path, spool.path()).await?;

        let id = UploadItemId(self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1);
        debug!(id = %id, file = %file_name, size_bytes, "staged upload");

        self.inner.state.lock().items.push(UploadItem {
            id,
            file_name,
            size_bytes,
            status: UploadStatus::Pending,
            error: None,
            spool: SpoolFile::new(spool),
        });
        self.bump();
        Ok(id)
    }

    /// Uploads every eligible item of the current queue, in order.
    ///
    /// Only one run is ever active; a second trigger returns
    /// [`RunOutcome::AlreadyRunning`] without starting a worker.
    pub async fn run(&self) -> RunOutcome {
        let batch: Vec<UploadItemId> = {
            let mut state = self.inner.state.lock();
            if state.running {
                debug!("upload run already active");
                return RunOutcome::AlreadyRunning;
            }
            let batch: Vec<_> = state
                .items
                .iter()
                .filter(|item| item.status.is_eligible())
                .map(|item| item.id)
                .collect();
            if batch.is_empty() {
                return RunOutcome::Empty;
            }
            state.running = true;
            batch
        };

        info!(items = batch.len(), "upload run started");
        let mut done = 0usize;
        let mut failed = 0usize;

        for id in batch {
            // The item may have been removed since the snapshot.
            let staged = {
                let mut state = self.inner.state.lock();
                match state.items.iter_mut().find(|item| item.id == id) {
                    Some(item) if item.status.is_eligible() => {
                        item.status = UploadStatus::Uploading;
                        item.error = None;
                        Some((item.file_name.clone(), item.spool.path().map(Path::to_path_buf)))
                    }
                    _ => None,
                }
            };
            let Some((file_name, spool_path)) = staged else {
                continue;
            };
            self.bump();

            let result: Result<(), String> = match spool_path {
                Some(path) => match tokio::fs::read(&path).await {
                    Ok(bytes) => self
                        .inner
                        .catalog
                        .upload(&file_name, bytes.into())
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(format!("failed to read staged file: {e}")),
                },
                None => Err("staged file already released".to_owned()),
            };

            {
                let mut state = self.inner.state.lock();
                if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                    match &result {
                        Ok(()) => {
                            item.status = UploadStatus::Done;
                            item.error = None;
                        }
                        Err(message) => {
                            item.status = UploadStatus::Error;
                            item.error = Some(message.clone());
                        }
                    }
                }
            }
            match result {
                Ok(()) => done += 1,
                Err(message) => {
                    warn!(id = %id, error = %message, "upload failed");
                    failed += 1;
                }
            }
            self.bump();
        }

        self.inner.state.lock().running = false;
        info!(done, failed, "upload run finished");

        // Exactly one invalidation and one aggregate notification per pass.
        self.inner.pages.invalidate(&QueryKey::default_listing());
        let summary = if failed == 0 {
            format!("Upload complete! {done} file(s) uploaded")
        } else {
            format!("Upload finished: {done} uploaded, {failed} failed")
        };
        if failed == 0 {
            self.inner.toasts.success(&summary);
        } else {
            self.inner.toasts.error(&summary);
        }
        self.inner.notifier.send("Uploads finished", &summary);

        RunOutcome::Completed { done, failed }
    }

    /// Removes one item and releases its spool file.
    ///
    /// # Errors
    /// Refuses while the item is uploading.
    pub fn remove(&self, id: UploadItemId) -> Result<(), UploadError> {
        {
            let mut state = self.inner.state.lock();
            let idx = state
                .items
                .iter()
                .position(|item| item.id == id)
                .ok_or(UploadError::UnknownItem)?;
            if state.items[idx].status == UploadStatus::Uploading {
                return Err(UploadError::InFlight);
            }
            let mut item = state.items.remove(idx);
            item.spool.release();
        }
        self.bump();
        Ok(())
    }

    /// Removes every item and releases all spool files.
    ///
    /// # Errors
    /// Refuses while a run is active; the uploading item could not be
    /// removed, so the whole clear is rejected.
    pub fn clear(&self) -> Result<usize, UploadError> {
        let count = {
            let mut state = self.inner.state.lock();
            if state.running {
                return Err(UploadError::RunActive);
            }
            let count = state.items.len();
            for item in &mut state.items {
                item.spool.release();
            }
            state.items.clear();
            count
        };
        if count > 0 {
            self.bump();
        }
        Ok(count)
    }

    /// Snapshots of all items, in queue order.
    #[must_use]
    pub fn items(&self) -> Vec<UploadItemView> {
        self.inner.state.lock().items.iter().map(UploadItem::view).collect()
    }

    /// Number of items the next run would pick up.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .items
            .iter()
            .filter(|item| item.status.is_eligible())
            .count()
    }

    /// Whether a run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Path of an item's staged copy, while not yet released.
    #[must_use]
    pub fn spool_path(&self, id: UploadItemId) -> Option<PathBuf> {
        let state = self.inner.state.lock();
        state
            .items
            .iter()
            .find(|item| item.id == id)
            .and_then(|item| item.spool.path().map(Path::to_path_buf))
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
    use tempfile::TempDir;

    use super::*;
    use crate::application::queries::page_cache;
    use crate::domain::ports::mocks::{MockCatalog, RecordingNotifier};
    use tokio_test::assert_ok;

    struct Rig {
        pipeline: UploadPipeline,
        catalog: Arc<MockCatalog>,
        pages: PageCache,
        toasts: ToastQueue,
        notifier: Arc<RecordingNotifier>,
        _sources: TempDir,
    }

    async fn rig_with_files(names: &[&str]) -> Rig {
        let catalog = Arc::new(MockCatalog::with_total(0));
        let pages = page_cache(catalog.clone());
        let toasts = ToastQueue::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let pipeline = UploadPipeline::new(
            catalog.clone(),
            pages.clone(),
            toasts.clone(),
            notifier.clone(),
        );

        let sources = TempDir::new().expect("source dir");
        for name in names {
            let path = sources.path().join(name);
            tokio::fs::write(&path, b"fake image bytes").await.expect("write source");
            pipeline.enqueue_file(&path).await.expect("enqueue");
        }

        Rig { pipeline, catalog, pages, toasts, notifier, _sources: sources }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pass_uploads_in_order_without_overlap() {
        let rig = rig_with_files(&["a.png", "b.png", "c.png"]).await;

        let outcome = rig.pipeline.run().await;
        assert_eq!(outcome, RunOutcome::Completed { done: 3, failed: 0 });

        assert_eq!(rig.catalog.uploaded(), vec!["a.png", "b.png", "c.png"]);
        assert!(rig.catalog.max_concurrent_uploads() <= 1);
        assert!(rig.pipeline.items().iter().all(|i| i.status == UploadStatus::Done));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trigger_during_run_is_a_noop() {
        let rig = rig_with_files(&["a.png", "b.png"]).await;

        let (first, second) = tokio::join!(rig.pipeline.run(), rig.pipeline.run());
        let outcomes = [first, second];

        assert!(outcomes.contains(&RunOutcome::Completed { done: 2, failed: 0 }));
        assert!(outcomes.contains(&RunOutcome::AlreadyRunning));
        // Each item was transferred exactly once.
        assert_eq!(rig.catalog.uploaded().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_item_failure_does_not_abort_the_pass() {
        let rig = rig_with_files(&["a.png", "b.png", "c.png"]).await;
        rig.catalog.fail_upload_of("b.png");

        let outcome = rig.pipeline.run().await;
        assert_eq!(outcome, RunOutcome::Completed { done: 2, failed: 1 });

        let items = rig.pipeline.items();
        assert_eq!(items[0].status, UploadStatus::Done);
        assert_eq!(items[1].status, UploadStatus::Error);
        assert!(items[1].error.as_deref().unwrap().contains("rejected"));
        assert_eq!(items[2].status, UploadStatus::Done);

        // The failed item is picked up again by the next run.
        assert_eq!(rig.pipeline.eligible_count(), 1);
        let retry = rig.pipeline.run().await;
        assert_eq!(retry, RunOutcome::Completed { done: 0, failed: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_invalidates_listing_exactly_once() {
        let rig = rig_with_files(&["a.png", "b.png"]).await;

        let mut listing = rig.pages.read(&QueryKey::default_listing());
        let _ = listing.updated().await;
        assert_eq!(rig.catalog.list_calls(), 1);

        let _ = rig.pipeline.run().await;
        let _ = listing.updated().await;
        assert_eq!(rig.catalog.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_emits_one_aggregate_notification() {
        let rig = rig_with_files(&["a.png", "b.png"]).await;

        let _ = rig.pipeline.run().await;

        assert_eq!(rig.toasts.visible().len(), 1);
        assert_eq!(rig.notifier.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_run_has_no_side_effects() {
        let rig = rig_with_files(&[]).await;

        assert_eq!(rig.pipeline.run().await, RunOutcome::Empty);
        assert!(rig.toasts.is_empty());
        assert!(rig.notifier.sent().is_empty());
        assert_eq!(rig.catalog.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear_are_forbidden_mid_transfer() {
        let rig = rig_with_files(&["a.png"]).await;
        let id = rig.pipeline.items()[0].id;
        let gate = rig.catalog.hold_uploads();

        let runner = rig.pipeline.clone();
        let handle = tokio::spawn(async move { runner.run().await });

        // Wait for the item to enter the uploading state; the gate keeps it
        // there.
        while rig.pipeline.items()[0].status != UploadStatus::Uploading {
            tokio::task::yield_now().await;
        }

        assert!(matches!(rig.pipeline.remove(id), Err(UploadError::InFlight)));
        assert!(matches!(rig.pipeline.clear(), Err(UploadError::RunActive)));

        gate.add_permits(1);
        assert_eq!(handle.await.unwrap(), RunOutcome::Completed { done: 1, failed: 0 });

        // Once the pass is over both operations work again.
        assert_ok!(rig.pipeline.remove(id));
        assert_eq!(rig.pipeline.clear().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_releases_the_spool_file() {
        let rig = rig_with_files(&["a.png"]).await;
        let id = rig.pipeline.items()[0].id;

        let spool = rig.pipeline.spool_path(id).expect("spool path");
        assert!(spool.exists());

        rig.pipeline.remove(id).expect("remove");
        assert!(!spool.exists());
        assert!(rig.pipeline.items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_releases_every_spool_file() {
        let rig = rig_with_files(&["a.png", "b.png"]).await;
        let spools: Vec<_> = rig
            .pipeline
            .items()
            .iter()
            .map(|item| rig.pipeline.spool_path(item.id).unwrap())
            .collect();

        assert_eq!(rig.pipeline.clear().unwrap(), 2);
        assert!(spools.iter().all(|p| !p.exists()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_image_files_are_rejected() {
        let rig = rig_with_files(&[]).await;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"hello").await.unwrap();

        let err = rig.pipeline.enqueue_file(&path).await.unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage { .. }));
        assert!(rig.pipeline.items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_file_names_stay_distinct() {
        let rig = rig_with_files(&["a.png", "a.png"]).await;
        // rig_with_files enqueues the same path twice; both entries exist.
        let items = rig.pipeline.items();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[0].file_name, items[1].file_name);
    }
}
