//! Stratum Storage - Cache tiers and host-facing provider
//!
//! Implements the two-tier cache behind the Stratum provider contract: a
//! process-local memoization tier ([`LocalMemo`]) in front of a shared
//! remote tier (the [`RemoteStore`] boundary, with Redis and in-memory
//! implementations), a tag-to-keys reverse index for bulk invalidation
//! ([`TagIndex`]), and the orchestrating [`CacheProvider`].
//!
//! The host-facing operations never fail: a degraded remote store degrades
//! the cache to a pass-through, never a stalled or erroring render.

pub mod memo;
pub mod memory_backend;
pub mod provider;
pub mod redis_backend;
pub mod remote;
pub mod tag_index;

pub use memo::{LocalMemo, MemoStats};
pub use memory_backend::MemoryRemoteStore;
pub use provider::{CacheProvider, CacheRuntime, ProviderContext, SetContext};
pub use redis_backend::RedisRemoteStore;
pub use remote::RemoteStore;
pub use tag_index::TagIndex;

// Re-export core types the provider contract surfaces.
pub use stratum_core::{
    cache_key, tag_key, CacheConfig, CacheEntry, CacheError, CacheHit, CacheResult,
};
