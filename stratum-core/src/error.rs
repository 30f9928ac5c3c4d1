//! Error types for Stratum cache operations.
//!
//! None of these errors ever cross the host-facing boundary: the provider
//! absorbs every one of them, degrading `get` to a miss and `set` /
//! `revalidate_tag` to no-ops. The taxonomy exists so the degrade path can
//! tell a deadline overrun apart from a store-reported failure, and so the
//! tag index knows when to switch to its fallback encoding.

use thiserror::Error;

/// Errors produced by the cache tiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A remote call did not complete within its deadline.
    ///
    /// Distinct from [`CacheError::Remote`]: the store may be healthy but
    /// slow or partitioned. The call is abandoned, never retried
    /// synchronously.
    #[error("remote {op} timed out after {timeout_ms}ms")]
    RemoteTimeout { op: &'static str, timeout_ms: u64 },

    /// The remote store was reachable but reported an error.
    #[error("remote {op} failed: {reason}")]
    Remote { op: &'static str, reason: String },

    /// Stored bytes were malformed or from an incompatible encoding.
    ///
    /// Callers treat this identically to a cache miss.
    #[error("entry decode failed: {reason}")]
    Decode { reason: String },

    /// The store does not support set-collection primitives.
    ///
    /// Signals the tag index to switch to the serialized-list fallback for
    /// the remainder of the process.
    #[error("set-collection operations unavailable on this store")]
    TagSetsUnsupported,
}

impl CacheError {
    /// True if the remote tier should be considered unavailable for this
    /// call (timeout or store-reported failure).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RemoteTimeout { .. } | Self::Remote { .. })
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode {
            reason: e.to_string(),
        }
    }
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_timeout_display() {
        let err = CacheError::RemoteTimeout {
            op: "get",
            timeout_ms: 500,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("get"));
        assert!(msg.contains("500"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_remote_error_display() {
        let err = CacheError::Remote {
            op: "expire",
            reason: "connection reset".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("expire"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_decode_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = CacheError::from(json_err);
        assert!(matches!(err, CacheError::Decode { .. }));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(CacheError::RemoteTimeout {
            op: "get",
            timeout_ms: 500
        }
        .is_unavailable());
        assert!(CacheError::Remote {
            op: "set",
            reason: "boom".to_string()
        }
        .is_unavailable());
        assert!(!CacheError::Decode {
            reason: "bad".to_string()
        }
        .is_unavailable());
        assert!(!CacheError::TagSetsUnsupported.is_unavailable());
    }
}
