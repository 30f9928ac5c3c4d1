//! Cache entry model and wire codec.
//!
//! An entry is written once and read many times: the opaque payload the host
//! handed us, the write instant, the soft-stale age derived from the host's
//! revalidate signal, and the invalidation tags recorded at write time.
//!
//! # Wire format
//!
//! Entries persist as a self-describing JSON record:
//!
//! ```json
//! { "value": ..., "lastModified": 1712345678901, "staleAge": 60, "tags": ["t"] }
//! ```
//!
//! `lastModified` is epoch milliseconds; `staleAge` is seconds. Records
//! written by earlier deployments may omit either field, in which case the
//! entry is never considered soft-stale (the store's own hard TTL still
//! bounds its lifetime).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheResult;

/// A single cache entry as persisted in the remote store.
///
/// Created on `set`, read-only thereafter; a later `set` under the same key
/// supersedes it wholesale (last-write-wins, no merge).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque payload supplied by the host.
    pub value: Value,

    /// Write instant, epoch milliseconds.
    #[serde(rename = "lastModified", default)]
    pub last_modified: i64,

    /// Age in seconds after which the entry is soft-stale: no longer fresh
    /// enough to serve, though it may still exist in storage until its hard
    /// TTL removes it.
    #[serde(rename = "staleAge", default)]
    pub stale_age: u64,

    /// Tags this entry was registered under at write time.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CacheEntry {
    /// Build an entry written at `now` with the given soft-stale age.
    pub fn new(value: Value, now: DateTime<Utc>, stale_age: u64, tags: Vec<String>) -> Self {
        Self {
            value,
            last_modified: now.timestamp_millis(),
            stale_age,
            tags,
        }
    }

    /// Serialize to the remote store's byte representation.
    pub fn to_bytes(&self) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from the remote store's byte representation.
    ///
    /// A malformed record yields [`crate::CacheError::Decode`]; callers
    /// treat that the same as a miss.
    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// True iff the entry is past its soft-stale boundary at `now`.
    ///
    /// Records missing a write instant or stale age are never soft-stale.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        if self.last_modified == 0 || self.stale_age == 0 {
            return false;
        }
        let stale_at = self.last_modified + (self.stale_age as i64) * 1000;
        now.timestamp_millis() > stale_at
    }
}

/// The host-facing view of a cache hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    /// The stored payload.
    pub value: Value,

    /// When the payload was written, epoch milliseconds.
    pub last_modified: i64,
}
