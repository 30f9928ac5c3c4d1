//! Tag-to-keys reverse index.
//!
//! Every `set` registers its fully-qualified cache key under each of the
//! entry's tags; `revalidate_tag` enumerates a tag's members to delete them
//! in bulk and then clears the record. The index lives in the remote store
//! so all processes share it.
//!
//! # Representations
//!
//! The preferred representation is a remote set (`sadd`/`smembers`). Stores
//! without set primitives get a fallback: the member list serialized as a
//! JSON string array under the same key. Once a store reports the
//! primitive unsupported, the fallback is pinned for the remainder of the
//! process; re-probing a store that lacks the command on every write would
//! just repeat the failure. A transient failure (timeout, connection drop)
//! falls back for that call only, without pinning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use stratum_core::{tag_key, CacheError, CacheResult};

use crate::remote::RemoteStore;

/// Reverse mapping from tag to member cache keys.
pub struct TagIndex {
    remote: Arc<dyn RemoteStore>,
    list_fallback: AtomicBool,
}

impl TagIndex {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            list_fallback: AtomicBool::new(false),
        }
    }

    /// True once the serialized-list representation has been pinned.
    pub fn using_fallback(&self) -> bool {
        self.list_fallback.load(Ordering::Relaxed)
    }

    fn pin_fallback(&self) {
        if !self.list_fallback.swap(true, Ordering::Relaxed) {
            debug!("tag index switching to serialized-list encoding");
        }
    }

    /// Register `member` under `tag` and refresh the record's TTL so the
    /// index lives at least as long as its newest member.
    pub async fn record(&self, tag: &str, member: &str, ttl_secs: u64) -> CacheResult<()> {
        let key = tag_key(tag);
        if !self.using_fallback() {
            match self.remote.sadd(&key, member).await {
                Ok(()) => {
                    self.remote.expire(&key, ttl_secs).await?;
                    return Ok(());
                }
                Err(CacheError::TagSetsUnsupported) => self.pin_fallback(),
                Err(_) => {}
            }
        }
        self.record_fallback(&key, member, ttl_secs).await
    }

    /// Read-modify-write of the JSON list form. Never duplicates an
    /// already-present member; an already-present member leaves the record
    /// untouched.
    async fn record_fallback(&self, key: &str, member: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut members: Vec<String> = match self.remote.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        if members.iter().any(|m| m == member) {
            return Ok(());
        }
        members.push(member.to_string());
        let encoded = serde_json::to_vec(&members)?;
        self.remote.set(key, &encoded).await?;
        self.remote.expire(key, ttl_secs).await
    }

    /// Enumerate the keys registered under `tag`. An absent tag yields an
    /// empty list.
    pub async fn members(&self, tag: &str) -> CacheResult<Vec<String>> {
        let key = tag_key(tag);
        if !self.using_fallback() {
            match self.remote.smembers(&key).await {
                Ok(members) => return Ok(members),
                Err(CacheError::TagSetsUnsupported) => self.pin_fallback(),
                Err(_) => {}
            }
        }
        match self.remote.get(&key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Delete the tag's record, whichever representation holds it.
    pub async fn clear(&self, tag: &str) -> CacheResult<()> {
        self.remote.del(&tag_key(tag)).await
    }
}
