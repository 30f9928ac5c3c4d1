//! Process-local memoization tier.
//!
//! One instance is shared by every provider in the process. It absorbs
//! bursts of duplicate lookups for the same key within a short window so
//! they never reach the remote store. It is purely a performance cache of
//! prior results, never the source of truth, and an entry must not
//! outlive the configured window, independent of the remote entry's own
//! staleness.
//!
//! Expired entries are evicted lazily on the next access; there is no
//! background sweep. Concurrent stores for the same key are
//! last-write-wins. The tier can be disabled wholesale by configuration,
//! in which case every operation is a no-op and every `get` falls through
//! to the remote tier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use stratum_core::{CacheConfig, CacheHit};

struct MemoEntry {
    hit: CacheHit,
    expires_at: Instant,
}

/// Hit/miss counts for the local tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

impl MemoStats {
    /// Hit rate from 0.0 to 1.0.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Short-TTL memoization map in front of the remote tier.
pub struct LocalMemo {
    entries: DashMap<String, MemoEntry>,
    ttl: Duration,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LocalMemo {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: config.in_memory_caching_time,
            enabled: config.in_memory_caching,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fetch an unexpired entry. Expired entries read as absent and are
    /// evicted on the way out.
    pub fn lookup(&self, key: &str) -> Option<CacheHit> {
        if !self.enabled {
            return None;
        }
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() < entry.expires_at {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.hit.clone());
            }
        }
        // Evict only if still expired: a concurrent store may have
        // refreshed the key since the read above.
        self.entries
            .remove_if(key, |_, entry| Instant::now() >= entry.expires_at);
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Memoize a result for the configured window. Last write wins.
    pub fn store(&self, key: &str, hit: CacheHit) {
        if !self.enabled {
            return;
        }
        self.entries.insert(
            key.to_string(),
            MemoEntry {
                hit,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        if !self.enabled {
            return;
        }
        self.entries.remove(key);
    }

    pub fn remove_all<S: AsRef<str>>(&self, keys: &[S]) {
        if !self.enabled {
            return;
        }
        for key in keys {
            self.entries.remove(key.as_ref());
        }
    }

    /// Snapshot of the tier's hit/miss counters.
    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
