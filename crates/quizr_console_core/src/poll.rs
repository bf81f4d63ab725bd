//! crates/quizr_console_core/src/poll.rs
//!
//! The cache-and-revalidate layer behind every list view and the auth check.
//!
//! Each distinct resource key (URL + token) owns one cached snapshot, one
//! in-flight flag, and at most one revalidation ticker. Subscribers share the
//! snapshot through a watch channel; the entry lives exactly as long as its
//! subscriber count stays above zero.

#[cfg(test)]
#[path = "poll_test.rs"]
mod poll_test;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::ports::ApiError;

//=========================================================================================
// Keys, Options, Snapshots
//=========================================================================================

/// Request identity: the endpoint URL plus the token it was issued under.
/// A token change yields a fresh key and therefore a fresh cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub url: String,
    pub token: String,
}

impl ResourceKey {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}

/// Revalidation options recognized by `subscribe`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Fixed revalidation cadence. `None` means fetch once on first
    /// subscription and only again on explicit `refresh`.
    pub interval: Option<Duration>,
}

impl FetchOptions {
    /// Single check, no recurring revalidation.
    pub fn once() -> Self {
        Self { interval: None }
    }

    /// Revalidate at a fixed cadence while at least one subscriber remains.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
        }
    }
}

/// The observable state of one resource.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Last known-good value. A failed revalidation never clears it.
    pub value: Option<T>,
    /// Error from the most recent fetch, cleared by the next success.
    pub error: Option<ApiError>,
    pub loading: bool,
    pub last_fetched: Option<DateTime<Utc>>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            loading: false,
            last_fetched: None,
        }
    }
}

impl<T> Snapshot<T> {
    /// True once a fetch has concluded, successfully or not.
    pub fn is_settled(&self) -> bool {
        !self.loading && (self.value.is_some() || self.error.is_some())
    }

    /// True when the value on display is older than the latest (failed)
    /// revalidation attempt.
    pub fn is_stale(&self) -> bool {
        self.value.is_some() && self.error.is_some()
    }
}

//=========================================================================================
// Pool internals
//=========================================================================================

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

struct Entry<T> {
    state: Arc<watch::Sender<Snapshot<T>>>,
    fetcher: Fetcher<T>,
    in_flight: Arc<AtomicBool>,
    subscribers: usize,
    ticker: Option<CancellationToken>,
}

struct PoolInner<T> {
    entries: Mutex<HashMap<ResourceKey, Entry<T>>>,
}

/// A keyed set of live polling resources.
pub struct ResourcePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for ResourcePool<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl<T> ResourcePool<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to the resource behind `key`, creating it on first use.
    ///
    /// When the entry has no cached value yet, an immediate fetch is issued.
    /// When `options.interval` is set and no ticker is running for the key, a
    /// repeating ticker starts; it is cancelled when the last subscription is
    /// dropped. A fetch already in flight for the key is shared, never
    /// duplicated.
    pub fn subscribe<F>(&self, key: ResourceKey, options: FetchOptions, fetch: F) -> Subscription<T>
    where
        F: Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync + 'static,
    {
        let mut entries = self.lock_entries();
        let entry = entries.entry(key.clone()).or_insert_with(|| {
            let (tx, _rx) = watch::channel(Snapshot::default());
            Entry {
                state: Arc::new(tx),
                fetcher: Arc::new(fetch),
                in_flight: Arc::new(AtomicBool::new(false)),
                subscribers: 0,
                ticker: None,
            }
        });
        entry.subscribers += 1;
        let rx = entry.state.subscribe();

        // A later subscriber may be the first one to ask for revalidation.
        if entry.ticker.is_none() {
            if let Some(interval) = options.interval {
                let token = CancellationToken::new();
                entry.ticker = Some(token.clone());
                spawn_ticker(
                    interval,
                    token,
                    entry.state.clone(),
                    entry.fetcher.clone(),
                    entry.in_flight.clone(),
                );
            }
        }

        if entry.state.borrow().value.is_none() {
            request_fetch(
                entry.state.clone(),
                entry.fetcher.clone(),
                entry.in_flight.clone(),
            );
        }
        drop(entries);

        Subscription {
            inner: self.inner.clone(),
            key,
            id: Uuid::new_v4(),
            rx,
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<ResourceKey, Entry<T>>> {
        self.inner.entries.lock().expect("resource pool lock poisoned")
    }

    /// Number of live entries; used by the views layer and tests.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Issues a fetch for an entry unless one is already in flight, in which case
/// the caller simply attaches to the pending result.
fn request_fetch<T>(
    state: Arc<watch::Sender<Snapshot<T>>>,
    fetcher: Fetcher<T>,
    in_flight: Arc<AtomicBool>,
) where
    T: Clone + Send + Sync + 'static,
{
    if in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }
    state.send_modify(|s| s.loading = true);

    tokio::spawn(async move {
        let result = (fetcher)().await;
        in_flight.store(false, Ordering::SeqCst);
        // Subscribers may all be gone by now; the update is then simply
        // discarded along with the channel.
        state.send_modify(|s| {
            s.loading = false;
            match result {
                Ok(value) => {
                    s.value = Some(value);
                    s.error = None;
                    s.last_fetched = Some(Utc::now());
                }
                Err(err) => {
                    tracing::debug!(error = %err, "resource revalidation failed; keeping stale value");
                    s.error = Some(err);
                }
            }
        });
    });
}

fn spawn_ticker<T>(
    interval: Duration,
    token: CancellationToken,
    state: Arc<watch::Sender<Snapshot<T>>>,
    fetcher: Fetcher<T>,
    in_flight: Arc<AtomicBool>,
) where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    request_fetch(state.clone(), fetcher.clone(), in_flight.clone());
                }
            }
        }
    });
}

//=========================================================================================
// Subscriptions
//=========================================================================================

/// A live handle onto one resource. Dropping the last subscription for a key
/// cancels its ticker and removes the entry from the pool.
pub struct Subscription<T> {
    inner: Arc<PoolInner<T>>,
    key: ResourceKey,
    #[allow(dead_code)]
    id: Uuid,
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// The current snapshot. Consumers check `error` here; fetch failures
    /// never propagate any other way.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Waits for the next snapshot update. Returns false when the resource
    /// is gone (last subscriber dropped elsewhere).
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits until the initial fetch has concluded and returns the result.
    pub async fn settled(&mut self) -> Snapshot<T> {
        loop {
            let snapshot = self.snapshot();
            if snapshot.is_settled() {
                return snapshot;
            }
            if self.rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Requests an immediate revalidation, subject to the dedup rule.
    pub fn refresh(&self) {
        let entries = self
            .inner
            .entries
            .lock()
            .expect("resource pool lock poisoned");
        if let Some(entry) = entries.get(&self.key) {
            request_fetch(
                entry.state.clone(),
                entry.fetcher.clone(),
                entry.in_flight.clone(),
            );
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let mut entries = match self.inner.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(entry) = entries.get_mut(&self.key) {
            entry.subscribers -= 1;
            if entry.subscribers == 0 {
                if let Some(ticker) = entry.ticker.take() {
                    ticker.cancel();
                }
                entries.remove(&self.key);
            }
        }
    }
}
