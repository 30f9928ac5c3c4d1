//! Stratum Core - Data types for the Stratum render-output cache
//!
//! Pure types shared by the cache tiers: the entry model and its wire
//! codec, fully-qualified key construction, the error taxonomy, and
//! environment-resolved configuration. No I/O happens in this crate.

pub mod config;
pub mod entry;
pub mod error;
pub mod key;

pub use config::CacheConfig;
pub use entry::{CacheEntry, CacheHit};
pub use error::{CacheError, CacheResult};
pub use key::{cache_key, tag_key};
