//! In-memory remote store.
//!
//! A process-local stand-in for the shared backend, used by tests and by
//! single-node deployments that want cache semantics without a network
//! round trip. Expiry is applied lazily on access, the way the remote
//! store's own TTL removal is observed by readers; there is no background
//! sweep.
//!
//! Per-operation call counters make cache-tier behavior observable from
//! tests (e.g. proving the local tier absorbed a duplicate lookup).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use stratum_core::{CacheError, CacheResult};

use crate::remote::RemoteStore;

struct ScalarEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
    ttl_secs: Option<u64>,
}

struct SetEntry {
    members: HashSet<String>,
    expires_at: Option<Instant>,
}

/// Call counts per operation, readable while the store is in use.
#[derive(Debug, Default)]
pub struct OpCounters {
    pub get: AtomicU64,
    pub set: AtomicU64,
    pub expire: AtomicU64,
    pub del: AtomicU64,
    pub sadd: AtomicU64,
    pub smembers: AtomicU64,
}

/// In-memory implementation of [`RemoteStore`].
pub struct MemoryRemoteStore {
    scalars: RwLock<HashMap<String, ScalarEntry>>,
    sets: RwLock<HashMap<String, SetEntry>>,
    sets_supported: bool,
    counters: OpCounters,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Create a store with full scalar and set-collection support.
    pub fn new() -> Self {
        Self {
            scalars: RwLock::new(HashMap::new()),
            sets: RwLock::new(HashMap::new()),
            sets_supported: true,
            counters: OpCounters::default(),
        }
    }

    /// Create a store whose `sadd`/`smembers` report
    /// [`CacheError::TagSetsUnsupported`], like a backend without set
    /// primitives. Exercises the tag index's serialized-list fallback.
    pub fn without_sets() -> Self {
        Self {
            sets_supported: false,
            ..Self::new()
        }
    }

    /// Per-operation call counts.
    pub fn counters(&self) -> &OpCounters {
        &self.counters
    }

    /// The TTL most recently applied to `key` by `expire`, in seconds.
    pub fn ttl_secs(&self, key: &str) -> Option<u64> {
        self.scalars.read().unwrap().get(key).and_then(|e| e.ttl_secs)
    }

    /// Number of live scalar entries (expired entries excluded).
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.scalars
            .read()
            .unwrap()
            .values()
            .filter(|e| e.expires_at.map(|at| now < at).unwrap_or(true))
            .count()
    }

    /// True when no live scalar entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(expires_at: Option<Instant>) -> bool {
        expires_at.map(|at| Instant::now() >= at).unwrap_or(false)
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.counters.get.fetch_add(1, Ordering::Relaxed);
        let mut scalars = self.scalars.write().unwrap();
        let expired = match scalars.get(key) {
            Some(entry) if Self::expired(entry.expires_at) => true,
            Some(entry) => return Ok(Some(entry.data.clone())),
            None => return Ok(None),
        };
        if expired {
            scalars.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.counters.set.fetch_add(1, Ordering::Relaxed);
        self.scalars.write().unwrap().insert(
            key.to_string(),
            ScalarEntry {
                data: value.to_vec(),
                expires_at: None,
                ttl_secs: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        self.counters.expire.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + Duration::from_secs(seconds);
        if let Some(entry) = self.scalars.write().unwrap().get_mut(key) {
            entry.expires_at = Some(deadline);
            entry.ttl_secs = Some(seconds);
        }
        if let Some(entry) = self.sets.write().unwrap().get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.counters.del.fetch_add(1, Ordering::Relaxed);
        self.scalars.write().unwrap().remove(key);
        self.sets.write().unwrap().remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> CacheResult<()> {
        self.counters.sadd.fetch_add(1, Ordering::Relaxed);
        if !self.sets_supported {
            return Err(CacheError::TagSetsUnsupported);
        }
        let mut sets = self.sets.write().unwrap();
        let entry = sets.entry(key.to_string()).or_insert_with(|| SetEntry {
            members: HashSet::new(),
            expires_at: None,
        });
        if Self::expired(entry.expires_at) {
            entry.members.clear();
            entry.expires_at = None;
        }
        entry.members.insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>> {
        self.counters.smembers.fetch_add(1, Ordering::Relaxed);
        if !self.sets_supported {
            return Err(CacheError::TagSetsUnsupported);
        }
        let mut sets = self.sets.write().unwrap();
        let expired = match sets.get(key) {
            Some(entry) if Self::expired(entry.expires_at) => true,
            Some(entry) => return Ok(entry.members.iter().cloned().collect()),
            None => return Ok(Vec::new()),
        };
        if expired {
            sets.remove(key);
        }
        Ok(Vec::new())
    }
}
