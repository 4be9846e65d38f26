//! In-memory TTL cache with single-flight request de-duplication
//!
//! Provides a `TtlCache` that memoizes the results of asynchronous producers
//! under string keys. Entries expire lazily after a fixed TTL, failures are
//! never stored, and concurrent misses for the same key share one in-flight
//! computation instead of issuing duplicates.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A single cached value together with the time it was produced
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// The cached value
    value: V,
    /// When the value was produced
    fetched_at: DateTime<Utc>,
}

/// Mutable cache state: stored entries plus in-flight computations
struct Inner<V, E> {
    entries: HashMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, Shared<BoxFuture<'static, Result<V, E>>>>,
}

/// Memoizing store for asynchronous fetches, keyed by request signature
///
/// An entry is valid only while `now - fetched_at < ttl`; expired entries are
/// treated as absent and overwritten on the next successful fetch, with no
/// background purging. A producer that fails leaves the cache untouched,
/// so the very next call for the same key retries it.
///
/// The cache is a cheap handle: clones share the same underlying store, so
/// construct one per concern and hand out clones.
pub struct TtlCache<V, E> {
    /// How long a stored value stays valid
    ttl: Duration,
    inner: Arc<Mutex<Inner<V, E>>>,
}

impl<V, E> Clone for TtlCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> TtlCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache whose entries stay fresh for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            })),
        }
    }

    /// Returns the cached value for `key`, or computes it via `producer`
    ///
    /// If a non-expired entry exists it is returned without invoking
    /// `producer`. If another caller is already computing this key, the
    /// outcome of that computation is shared. Otherwise `producer` runs, and
    /// only on success is the result stored before being returned.
    ///
    /// # Arguments
    /// * `key` - Request signature identifying the cached value
    /// * `producer` - Fallible async computation used on a cache miss
    pub async fn get_or_compute<F, Fut>(&self, key: &str, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut inner = self.inner.lock().expect("cache lock poisoned");

            if let Some(entry) = inner.entries.get(key) {
                if Utc::now() - entry.fetched_at < self.ttl {
                    debug!(key, "serving cached value");
                    return Ok(entry.value.clone());
                }
            }

            if let Some(existing) = inner.in_flight.get(key) {
                debug!(key, "joining in-flight fetch");
                existing.clone()
            } else {
                let state = Arc::clone(&self.inner);
                let owned_key = key.to_string();
                let fut = producer();
                let shared = async move {
                    let result = fut.await;
                    complete(&state, &owned_key, &result);
                    result
                }
                .boxed()
                .shared();
                inner.in_flight.insert(key.to_string(), shared.clone());
                shared
            }
        };

        shared.await
    }
}

/// Records the outcome of an in-flight computation
///
/// Successful values are stored with the current timestamp; failures only
/// clear the in-flight slot so the next caller retries.
fn complete<V: Clone, E>(state: &Mutex<Inner<V, E>>, key: &str, result: &Result<V, E>) {
    let mut inner = state.lock().expect("cache lock poisoned");
    inner.in_flight.remove(key);
    if let Ok(value) = result {
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                fetched_at: Utc::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError(&'static str);

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: i32,
    ) -> impl Future<Output = Result<i32, TestError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_producer() {
        let cache = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_compute("key", || counting_producer(&calls, 42))
            .await;
        let second = cache
            .get_or_compute("key", || counting_producer(&calls, 99))
            .await;

        assert_eq!(first, Ok(42));
        assert_eq!(second, Ok(42), "Second read should return the cached value");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "Producer should run once");
    }

    #[tokio::test]
    async fn test_expired_entry_reinvokes_producer() {
        let cache = TtlCache::new(Duration::milliseconds(30));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_compute("key", || counting_producer(&calls, 1))
            .await;
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        let second = cache
            .get_or_compute("key", || counting_producer(&calls, 2))
            .await;

        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(2), "Expired entry should be recomputed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache: TtlCache<i32, TestError> = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = Arc::clone(&calls);
            cache.get_or_compute("key", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError("boom"))
            })
        }
        .await;
        assert_eq!(failing, Err(TestError("boom")));

        let retried = cache
            .get_or_compute("key", || counting_producer(&calls, 7))
            .await;

        assert_eq!(retried, Ok(7), "Failure must be retryable on the next call");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_computation() {
        let cache = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_producer = || {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(StdDuration::from_millis(50)).await;
                    Ok::<i32, TestError>(5)
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_compute("key", slow_producer()),
            cache.get_or_compute("key", slow_producer()),
        );

        assert_eq!(a, Ok(5));
        assert_eq!(b, Ok(5));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "Concurrent callers for the same key should share one producer run"
        );
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache
            .get_or_compute("a", || counting_producer(&calls, 1))
            .await;
        let b = cache
            .get_or_compute("b", || counting_producer(&calls, 2))
            .await;

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_value_is_stable_within_ttl() {
        let cache = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .get_or_compute("key", || counting_producer(&calls, 10))
            .await;
        for _ in 0..5 {
            let read = cache
                .get_or_compute("key", || counting_producer(&calls, 11))
                .await;
            assert_eq!(read, first, "Reads within the TTL must return the same value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clones_share_the_same_store() {
        let cache = TtlCache::new(Duration::minutes(5));
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = cache.clone();
        let first = cache
            .get_or_compute("key", || counting_producer(&calls, 3))
            .await;
        let second = handle
            .get_or_compute("key", || counting_producer(&calls, 4))
            .await;

        assert_eq!(first, Ok(3));
        assert_eq!(second, Ok(3), "A clone must see values cached via the original");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
