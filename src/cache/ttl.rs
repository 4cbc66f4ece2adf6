//! Generic per-key TTL cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache with per-entry expiry and stale-on-error fallback.
///
/// Entries outlive their TTL: an expired entry is no longer served as fresh,
/// but it is still returned when recomputing it fails. Concurrent callers on
/// the same key are serialized so that a single computation serves all of
/// them.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // A panic while holding the lock leaves the map itself intact
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn release_key_lock(&self, key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Ours plus the map's: nobody else is waiting on this key
        if Arc::strong_count(&lock) <= 2 {
            inflight.remove(key);
        }
    }

    /// Returns the live value for `key`, if any.
    pub fn get_fresh(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock_entries()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    fn get_any(&self, key: &str) -> Option<V> {
        self.lock_entries().get(key).map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, live for `ttl`.
    pub fn insert(&self, key: &str, value: V, ttl: Duration) {
        self.lock_entries().insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn compute_and_store<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::fmt::Display,
    {
        match compute().await {
            Ok(value) => {
                self.insert(key, value.clone(), ttl);
                Ok(value)
            }
            Err(e) => match self.get_any(key) {
                Some(stale) => {
                    warn!("Refreshing {key} failed ({e}), serving stale value");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }

    /// Returns the live value for `key`, computing and storing it on a miss.
    ///
    /// If `compute` fails and an expired entry exists, the expired value is
    /// returned and a warning logged. Without any entry the error propagates.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::fmt::Display,
    {
        if let Some(value) = self.get_fresh(key) {
            debug!("Cache hit for {key}");
            return Ok(value);
        }

        let lock = self.key_lock(key);
        let result = {
            let _guard = lock.lock().await;
            // Another caller may have filled the entry while we waited
            match self.get_fresh(key) {
                Some(value) => {
                    debug!("Cache filled by a concurrent caller for {key}");
                    Ok(value)
                }
                None => {
                    debug!("Cache miss for {key}");
                    self.compute_and_store(key, ttl, compute).await
                }
            }
        };
        self.release_key_lock(key, lock);
        result
    }

    /// Recomputes `key` regardless of freshness. The stale fallback still
    /// applies when `compute` fails.
    pub async fn refresh<F, Fut, E>(&self, key: &str, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::fmt::Display,
    {
        let lock = self.key_lock(key);
        let result = {
            let _guard = lock.lock().await;
            self.compute_and_store(key, ttl, compute).await
        };
        self.release_key_lock(key, lock);
        result
    }

    /// Removes `key`. Returns whether an entry existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock_entries().remove(key).is_some()
    }

    /// Removes every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Number of entries, live or expired.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
