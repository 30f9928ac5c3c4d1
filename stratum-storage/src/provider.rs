//! Host-facing cache provider.
//!
//! The rendering host constructs one short-lived [`CacheProvider`] per
//! render from the process-wide [`CacheRuntime`] and calls `get`, `set`,
//! and `revalidate_tag` on it. None of the three ever surfaces an error:
//! the cache degrades to "empty or unavailable" and the host proceeds.
//! A failed cache write is the same as the entry never having been cached.
//!
//! Every absorbed failure funnels through one degrade-and-record policy
//! function, so the whole error taxonomy stays observable on a single
//! tracing channel.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use stratum_core::{cache_key, CacheConfig, CacheEntry, CacheError, CacheHit, CacheResult};

use crate::memo::LocalMemo;
use crate::redis_backend::RedisRemoteStore;
use crate::remote::RemoteStore;
use crate::tag_index::TagIndex;

/// Identity of the render a provider instance serves. Immutable for the
/// instance's lifetime.
#[derive(Debug, Clone, Default)]
pub struct ProviderContext {
    pub pathname: String,
    /// Distinguishes entry classes (route-handler output, page output,
    /// fetch-level entries) that may share a literal caller key.
    pub kind: Option<String>,
}

/// Write-time context supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct SetContext {
    /// Host's "revalidate after N seconds" signal. Non-positive or absent
    /// values fall back to the configured default stale age.
    pub revalidate: Option<i64>,
    /// Tags to register this entry under for bulk invalidation.
    pub tags: Vec<String>,
}

/// Process-wide cache state: configuration, the shared remote handle, the
/// local memoization tier, and the tag index. Construct once, then mint a
/// [`CacheProvider`] per render.
#[derive(Clone)]
pub struct CacheRuntime {
    config: Arc<CacheConfig>,
    remote: Arc<dyn RemoteStore>,
    memo: Arc<LocalMemo>,
    tag_index: Arc<TagIndex>,
}

impl CacheRuntime {
    /// Build a runtime over an injected remote store.
    pub fn new(config: CacheConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let memo = Arc::new(LocalMemo::new(&config));
        let tag_index = Arc::new(TagIndex::new(remote.clone()));
        Self {
            config: Arc::new(config),
            remote,
            memo,
            tag_index,
        }
    }

    /// Build a runtime from environment configuration, backed by Redis.
    /// The connection itself is established lazily on first use.
    pub fn from_env() -> CacheResult<Self> {
        let config = CacheConfig::from_env();
        let remote = Arc::new(RedisRemoteStore::new(&config)?);
        Ok(Self::new(config, remote))
    }

    /// Mint a provider for one render.
    pub fn provider(&self, ctx: ProviderContext) -> CacheProvider {
        CacheProvider {
            config: self.config.clone(),
            remote: self.remote.clone(),
            memo: self.memo.clone(),
            tag_index: self.tag_index.clone(),
            pathname: ctx.pathname,
            kind: ctx.kind,
        }
    }

    /// The runtime's configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The local memoization tier (e.g. for stats).
    pub fn memo(&self) -> &LocalMemo {
        &self.memo
    }
}

/// Per-render cache handle implementing the host-facing contract.
pub struct CacheProvider {
    config: Arc<CacheConfig>,
    remote: Arc<dyn RemoteStore>,
    memo: Arc<LocalMemo>,
    tag_index: Arc<TagIndex>,
    pathname: String,
    kind: Option<String>,
}

impl CacheProvider {
    fn qualified_key(&self, key: &str) -> String {
        cache_key(key, &self.pathname, self.kind.as_deref())
    }

    /// Degrade-and-record policy: every failure the provider absorbs goes
    /// through here, and nowhere else.
    fn degrade(op: &'static str, key: &str, err: &CacheError) {
        match err {
            CacheError::RemoteTimeout { .. } | CacheError::Remote { .. } => {
                warn!(op, key, error = %err, "remote tier unavailable for this call");
            }
            CacheError::Decode { .. } => {
                debug!(op, key, error = %err, "undecodable record treated as a miss");
            }
            CacheError::TagSetsUnsupported => {
                debug!(op, key, error = %err, "set primitives unavailable");
            }
        }
    }

    /// Fetch the entry stored under `key`, or `None` if it is absent,
    /// soft-stale, undecodable, or the remote tier is unavailable.
    pub async fn get(&self, key: &str) -> Option<CacheHit> {
        let cache_key = self.qualified_key(key);

        if let Some(hit) = self.memo.lookup(&cache_key) {
            return Some(hit);
        }

        let bytes = match self.remote.get(&cache_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                Self::degrade("get", &cache_key, &e);
                return None;
            }
        };

        let entry = match CacheEntry::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                Self::degrade("get", &cache_key, &e);
                return None;
            }
        };

        let now = Utc::now();
        if entry.is_stale(now) {
            // A stale entry is a miss for retrieval: drop it (best effort)
            // and let the host regenerate.
            if let Err(e) = self.remote.del(&cache_key).await {
                Self::degrade("stale-del", &cache_key, &e);
            }
            return None;
        }

        let last_modified = if entry.last_modified != 0 {
            entry.last_modified
        } else {
            now.timestamp_millis()
        };
        let hit = CacheHit {
            value: entry.value,
            last_modified,
        };
        self.memo.store(&cache_key, hit.clone());
        Some(hit)
    }

    /// Store `payload` under `key`. Failures are absorbed; a failed cache
    /// write is equivalent to the entry not being cached.
    pub async fn set(&self, key: &str, payload: Value, ctx: &SetContext) {
        let cache_key = self.qualified_key(key);

        let stale_age = self.config.effective_stale_age(ctx.revalidate);
        let expire_age = self.config.hard_expire_age(stale_age);
        let now = Utc::now();

        let entry = CacheEntry::new(payload, now, stale_age, ctx.tags.clone());
        let bytes = match entry.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                Self::degrade("set", &cache_key, &e);
                return;
            }
        };

        if let Err(e) = self.remote.set(&cache_key, &bytes).await {
            Self::degrade("set", &cache_key, &e);
            return;
        }
        if let Err(e) = self.remote.expire(&cache_key, expire_age).await {
            // The write landed; the entry is merely unbounded until the
            // next overwrite restores a TTL.
            Self::degrade("expire", &cache_key, &e);
        }

        self.memo.store(
            &cache_key,
            CacheHit {
                value: entry.value.clone(),
                last_modified: entry.last_modified,
            },
        );

        for tag in &ctx.tags {
            if let Err(e) = self.tag_index.record(tag, &cache_key, expire_age).await {
                Self::degrade("tag-record", &cache_key, &e);
            }
        }
    }

    /// Invalidate every entry registered under `tag`, then clear the tag's
    /// index record. Failures are absorbed; per-key deletions are
    /// independent. Idempotent.
    pub async fn revalidate_tag(&self, tag: &str) {
        let members = match self.tag_index.members(tag).await {
            Ok(members) => members,
            Err(e) => {
                Self::degrade("tag-members", tag, &e);
                return;
            }
        };

        for member in &members {
            if let Err(e) = self.remote.del(member).await {
                Self::degrade("tag-del", member, &e);
            }
        }
        self.memo.remove_all(&members);

        if let Err(e) = self.tag_index.clear(tag).await {
            Self::degrade("tag-clear", tag, &e);
        }
    }
}
