use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Cached value with its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory TTL cache with get-or-compute semantics.
///
/// Only successful computations are stored: an `Err` from `compute` is
/// returned to the caller without touching the map, so the next lookup with
/// the same key runs the computation again.
#[derive(Debug, Default)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if still fresh, otherwise run
    /// `compute` and store its result under `key` with expiry now + `ttl`.
    ///
    /// The map lock is held across the computation, so concurrent callers
    /// with the same key wait for the in-flight result instead of
    /// duplicating work.
    pub async fn get_or_compute<E, F, Fut>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(&key) {
            if !entry.is_expired() {
                return Ok(entry.value.clone());
            }
        }

        let value = compute().await?;
        entries.insert(key, CacheEntry::new(value.clone(), ttl));
        Ok(value)
    }

    /// Number of entries currently held (fresh or expired).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
