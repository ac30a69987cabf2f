//! Time-boxed response cache with insertion-order eviction.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default number of cached responses.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default lifetime of a cached response.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    max_age: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.max_age
    }
}

/// Bounded cache for API responses.
///
/// Reads never refresh an entry's position, so the entry evicted on overflow
/// is always the oldest inserted one.
pub struct ResponseCache<V = serde_json::Value> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    default_max_age: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResponseCache<V> {
    /// Creates a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize, default_max_age: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            default_max_age,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a cache with default capacity and lifetime.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_MAX_AGE)
    }

    /// Builds the cache key for `endpoint` and its query parameters.
    ///
    /// Parameters are sorted by name so that equal parameter sets always map
    /// to the same key regardless of the order they were supplied in.
    pub fn generate_key<K, P>(endpoint: &str, params: impl IntoIterator<Item = (K, P)>) -> String
    where
        K: Into<String>,
        P: Display,
    {
        let sorted: BTreeMap<String, String> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();

        if sorted.is_empty() {
            return endpoint.to_string();
        }

        let query = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{endpoint}?{query}")
    }

    /// Stores `value`, evicting the oldest entry when full.
    pub fn set(&self, key: impl Into<String>, value: V, max_age: Option<Duration>) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            max_age: max_age.unwrap_or(self.default_max_age),
        };

        let mut entries = self.entries.lock();
        if let Some((evicted, _)) = entries.push(key.clone(), entry)
            && evicted != key
        {
            debug!(key = %evicted, "Evicted oldest cache entry");
        }
        trace!(key = %key, "Cached response");
    }

    /// Returns the value for `key` unless it is absent or expired.
    ///
    /// Expired entries are removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let lookup = entries
            .peek(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache hit");
                Some(value)
            }
            Some(None) => {
                entries.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache entry expired");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(key, "Cache miss");
                None
            }
        }
    }

    /// Returns true if a live entry exists for `key`.
    ///
    /// Expired entries are removed.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.peek(key).map(|entry| entry.is_expired(now)) {
            Some(false) => true,
            Some(true) => {
                entries.pop(key);
                false
            }
            None => false,
        }
    }

    /// Removes one entry.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Cleared response cache");
    }

    /// Number of stored entries, including ones not yet found expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
        }
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Current number of entries.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} entries, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}
