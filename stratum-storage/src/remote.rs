//! Remote store boundary.
//!
//! This trait abstracts the shared backend every process in the deployment
//! reads and writes through. Implementations must bound every call with a
//! deadline: a stalled store must surface as [`CacheError::RemoteTimeout`],
//! never as an unbounded wait. The provider treats a timeout and a
//! store-reported error identically (the remote tier is unavailable for
//! that call) and degrades instead of propagating.
//!
//! [`CacheError::RemoteTimeout`]: stratum_core::CacheError::RemoteTimeout

use async_trait::async_trait;
use stratum_core::CacheResult;

/// Byte-string operations against the shared remote store.
///
/// Scalar operations are required; the set-collection pair is best-effort.
/// A store without set primitives signals
/// [`stratum_core::CacheError::TagSetsUnsupported`] from `sadd`/`smembers`
/// so the tag index can fall back to its serialized-list encoding.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;

    /// Set or refresh the TTL of `key` to `seconds`. Missing keys are a
    /// no-op, not an error.
    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()>;

    /// Delete `key`. Missing keys are a no-op, not an error.
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Add `member` to the set stored under `key`, creating it if absent.
    async fn sadd(&self, key: &str, member: &str) -> CacheResult<()>;

    /// Enumerate the members of the set stored under `key`. An absent key
    /// yields an empty list, not an error.
    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>>;
}
