//! Shared response cache with request coalescing, invalidation, and retry.
//!
//! One [`RemoteCache`] instance is the single shared store for one family of
//! responses; every consumer goes through its key-indexed API and receives
//! updates over a per-entry watch channel. The cache guarantees at most one
//! in-flight request per key regardless of how many readers attach in the
//! same scheduling tick.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::domain::errors::ApiError;

/// Fixed delay between retry attempts for transient failures.
pub const RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Maximum number of retries after the initial attempt.
pub const RETRY_LIMIT: u32 = 3;

/// Issues the network request backing a cache key.
#[async_trait]
pub trait Fetch<K, V>: Send + Sync {
    /// Performs one request for `key`.
    async fn fetch(&self, key: &K) -> Result<V, ApiError>;
}

/// State of a cache entry as seen by its subscribers.
#[derive(Debug, Clone)]
pub enum CacheStatus<V> {
    /// No response has arrived yet.
    Pending,
    /// Last fetch succeeded. The value may be stale while a revalidation is
    /// in flight; subscribers keep rendering it until the fresh one lands.
    Resolved(V),
    /// Last fetch failed after the retry policy was exhausted.
    Error(ApiError),
}

impl<V> CacheStatus<V> {
    /// The resolved value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&V> {
        match self {
            Self::Resolved(v) => Some(v),
            _ => None,
        }
    }

    /// The surfaced error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Whether no response has arrived yet.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Bookkeeping snapshot of one entry, for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Live subscriber count.
    pub subscribers: usize,
    /// Whether a fetch is outstanding.
    pub in_flight: bool,
    /// Whether the entry was invalidated since its last fetch.
    pub stale: bool,
    /// Completion time of the last fetch.
    pub last_fetched_at: Option<Instant>,
}

struct Entry<V> {
    tx: watch::Sender<CacheStatus<V>>,
    subscribers: usize,
    in_flight: bool,
    stale: bool,
    last_fetched_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn new() -> Self {
        let (tx, _) = watch::channel(CacheStatus::Pending);
        Self {
            tx,
            subscribers: 0,
            in_flight: false,
            stale: true,
            last_fetched_at: None,
        }
    }
}

struct CacheInner<K, V> {
    fetcher: Arc<dyn Fetch<K, V>>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

/// Key-indexed store of remote responses.
///
/// Cheap to clone; clones share the same entries. There is no ambient
/// global cache: instances are passed to consumers, so tests can run
/// isolated stores.
pub struct RemoteCache<K, V> {
    inner: Arc<CacheInner<K, V>>,
}

impl<K, V> Clone for RemoteCache<K, V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> RemoteCache<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache over the given fetcher.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetch<K, V>>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Subscribes to `key` and returns its current state.
    ///
    /// If no fetch is outstanding for the key, one is started; concurrent
    /// reads of the same key in the same tick share that single request.
    /// Dropping the returned reader unsubscribes without cancelling a fetch
    /// other readers still share.
    pub fn read(&self, key: &K) -> CacheReader<K, V> {
        let (rx, start) = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.subscribers += 1;
            let start = !entry.in_flight;
            if start {
                entry.in_flight = true;
            }
            (entry.tx.subscribe(), start)
        };

        if start {
            trace!(key = %key, "starting fetch");
            self.spawn_fetch(key.clone());
        }

        CacheReader {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            rx,
        }
    }

    /// Marks `key` stale and, when the key has live subscribers, starts
    /// exactly one shared background refetch.
    pub fn invalidate(&self, key: &K) {
        let start = {
            let mut entries = self.inner.entries.lock();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };
            entry.stale = true;
            let start = entry.subscribers > 0 && !entry.in_flight;
            if start {
                entry.in_flight = true;
            }
            start
        };

        if start {
            debug!(key = %key, "invalidated, refetching");
            self.spawn_fetch(key.clone());
        }
    }

    /// Overwrites the entry value without a refetch.
    ///
    /// Used when the caller already knows the authoritative state, e.g.
    /// force-clearing the session after logout.
    pub fn write(&self, key: &K, value: V) {
        let mut entries = self.inner.entries.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.stale = false;
        entry.last_fetched_at = Some(Instant::now());
        entry.tx.send_replace(CacheStatus::Resolved(value));
    }

    /// Bookkeeping snapshot of one entry.
    #[must_use]
    pub fn entry_info(&self, key: &K) -> Option<EntryInfo> {
        let entries = self.inner.entries.lock();
        entries.get(key).map(|entry| EntryInfo {
            subscribers: entry.subscribers,
            in_flight: entry.in_flight,
            stale: entry.stale,
            last_fetched_at: entry.last_fetched_at,
        })
    }

    fn spawn_fetch(&self, key: K) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut retries = 0u32;
            let outcome = loop {
                match inner.fetcher.fetch(&key).await {
                    Ok(value) => break Ok(value),
                    Err(e) if e.is_retryable() && retries < RETRY_LIMIT => {
                        retries += 1;
                        warn!(key = %key, error = %e, retries, "transient failure, will retry");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    Err(e) => break Err(e),
                }
            };

            let mut entries = inner.entries.lock();
            let Some(entry) = entries.get_mut(&key) else {
                return;
            };
            entry.in_flight = false;
            entry.last_fetched_at = Some(Instant::now());
            match outcome {
                Ok(value) => {
                    entry.stale = false;
                    entry.tx.send_replace(CacheStatus::Resolved(value));
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "fetch failed");
                    entry.tx.send_replace(CacheStatus::Error(e));
                }
            }
        });
    }
}

/// Live subscription to one cache entry.
///
/// Dropping the reader unsubscribes its view; updates keep flowing to the
/// remaining readers of the same key.
pub struct CacheReader<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
{
    inner: Arc<CacheInner<K, V>>,
    key: K,
    rx: watch::Receiver<CacheStatus<V>>,
}

impl<K, V> CacheReader<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
    V: Clone,
{
    /// The subscribed key.
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Current entry state without consuming the change flag.
    #[must_use]
    pub fn snapshot(&self) -> CacheStatus<V> {
        self.rx.borrow().clone()
    }

    /// Whether the entry changed since the last [`Self::latest`] call.
    pub fn changed(&mut self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Current entry state, consuming the change flag.
    pub fn latest(&mut self) -> CacheStatus<V> {
        self.rx.borrow_and_update().clone()
    }

    /// Waits for the next update and returns it.
    pub async fn updated(&mut self) -> CacheStatus<V> {
        // Only errors when the cache itself is gone.
        let _ = self.rx.changed().await;
        self.latest()
    }
}

impl<K, V> Drop for CacheReader<K, V>
where
    K: Clone + Eq + Hash + Display + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let mut entries = self.inner.entries.lock();
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Semaphore;

    use super::*;

    /// Fetcher with scripted results and an optional gate that holds every
    /// request until the test releases it.
    struct ScriptedFetch {
        calls: AtomicUsize,
        results: Mutex<VecDeque<Result<u32, ApiError>>>,
        gate: Option<Semaphore>,
    }

    impl ScriptedFetch {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(VecDeque::new()),
                gate: None,
            })
        }

        fn gated() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(VecDeque::new()),
                gate: Some(Semaphore::new(0)),
            })
        }

        fn script(self: &Arc<Self>, results: impl IntoIterator<Item = Result<u32, ApiError>>) {
            self.results.lock().extend(results);
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetch<String, u32> for ScriptedFetch {
        async fn fetch(&self, _key: &String) -> Result<u32, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(gate) = &self.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            let scripted = self.results.lock().pop_front();
            scripted.unwrap_or(Ok(u32::try_from(call).unwrap()))
        }
    }

    fn cache_over(fetcher: Arc<ScriptedFetch>) -> RemoteCache<String, u32> {
        RemoteCache::new(fetcher)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_request() {
        let fetcher = ScriptedFetch::gated();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut readers = vec![cache.read(&key), cache.read(&key), cache.read(&key)];
        settle().await;

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.entry_info(&key).unwrap().subscribers, 3);
        assert!(readers.iter().all(|r| r.snapshot().is_pending()));

        fetcher.release();
        for reader in &mut readers {
            let status = reader.updated().await;
            assert_eq!(status.value(), Some(&1));
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_serves_stale_value_while_revalidating() {
        let fetcher = ScriptedFetch::new();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut first = cache.read(&key);
        assert_eq!(first.updated().await.value(), Some(&1));

        // A later read sees the cached value immediately and kicks off a
        // revalidation in the background.
        let mut second = cache.read(&key);
        assert_eq!(second.snapshot().value(), Some(&1));
        assert_eq!(second.updated().await.value(), Some(&2));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_refetches_once_for_subscribers() {
        let fetcher = ScriptedFetch::new();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut a = cache.read(&key);
        let mut b = cache.read(&key);
        // The two initial reads coalesced into one request.
        assert_eq!(a.updated().await.value(), Some(&1));
        let _ = b.latest();
        assert_eq!(fetcher.calls(), 1);

        cache.invalidate(&key);
        assert_eq!(a.updated().await.value(), Some(&2));
        assert_eq!(b.updated().await.value(), Some(&2));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_invalidations_coalesce() {
        let fetcher = ScriptedFetch::gated();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        fetcher.release();
        assert_eq!(reader.updated().await.value(), Some(&1));

        cache.invalidate(&key);
        cache.invalidate(&key);
        settle().await;
        assert_eq!(fetcher.calls(), 2);

        fetcher.release();
        assert_eq!(reader.updated().await.value(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_without_subscribers_skips_refetch() {
        let fetcher = ScriptedFetch::new();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        let _ = reader.updated().await;
        drop(reader);

        cache.invalidate(&key);
        settle().await;

        assert_eq!(fetcher.calls(), 1);
        let info = cache.entry_info(&key).unwrap();
        assert!(info.stale);
        assert_eq!(info.subscribers, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_never_retried() {
        let fetcher = ScriptedFetch::new();
        fetcher.script([Err(ApiError::client(404, "not found"))]);
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        let status = reader.updated().await;
        assert_eq!(status.error(), Some(&ApiError::client(404, "not found")));
        assert_eq!(fetcher.calls(), 1);

        // Even with time to spare, no retry happens.
        tokio::time::sleep(RETRY_DELAY * 4).await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retry_until_success() {
        let fetcher = ScriptedFetch::new();
        fetcher.script([
            Err(ApiError::transient("reset")),
            Err(ApiError::transient("reset")),
            Ok(7),
        ]);
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        let status = reader.updated().await;
        assert_eq!(status.value(), Some(&7));
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_surface_after_retry_limit() {
        let fetcher = ScriptedFetch::new();
        fetcher.script(std::iter::repeat_n(Err(ApiError::transient("down")), 8));
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        let status = reader.updated().await;
        assert_eq!(status.error(), Some(&ApiError::transient("down")));
        assert_eq!(fetcher.calls(), 1 + RETRY_LIMIT as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_updates_without_refetch() {
        let fetcher = ScriptedFetch::new();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut reader = cache.read(&key);
        let _ = reader.updated().await;
        assert_eq!(fetcher.calls(), 1);

        cache.write(&key, 99);
        assert_eq!(reader.updated().await.value(), Some(&99));
        settle().await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_keeps_shared_fetch_alive() {
        let fetcher = ScriptedFetch::gated();
        let cache = cache_over(fetcher.clone());
        let key = "k".to_string();

        let mut keeper = cache.read(&key);
        let dropped = cache.read(&key);
        settle().await;
        assert_eq!(fetcher.calls(), 1);

        drop(dropped);
        assert_eq!(cache.entry_info(&key).unwrap().subscribers, 1);

        fetcher.release();
        assert_eq!(keeper.updated().await.value(), Some(&1));
        assert_eq!(fetcher.calls(), 1);
    }
}
