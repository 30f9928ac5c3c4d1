//! Redis-backed remote store.
//!
//! Drives a Redis- or Valkey-compatible backend through a multiplexed async
//! connection. Connection establishment is lazy: the first call builds the
//! connection (bounded by the connect timeout) and memoizes it for the
//! process; a failed attempt is logged and retried on the next call. Once
//! established, reconnection after a drop is the multiplexed client's
//! responsibility, not this adapter's.
//!
//! Every command is wrapped in an explicit deadline. There is no unbounded
//! wait anywhere in this adapter, and a timed-out call is abandoned, never
//! retried synchronously.

use std::future::Future;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::warn;

use stratum_core::{CacheConfig, CacheError, CacheResult};

use crate::remote::RemoteStore;

/// [`RemoteStore`] implementation over a shared Redis connection.
pub struct RedisRemoteStore {
    client: redis::Client,
    conn: OnceCell<MultiplexedConnection>,
    command_timeout: Duration,
    connect_timeout: Duration,
}

impl RedisRemoteStore {
    /// Build an adapter from configuration. The URL (scheme, host, port,
    /// credentials, database index, `rediss://` TLS) is parsed here, once;
    /// no connection is attempted until the first call.
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str()).map_err(|e| {
            CacheError::Remote {
                op: "connect",
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            command_timeout: config.command_timeout,
            connect_timeout: config.connect_timeout,
        })
    }

    /// The process-wide connection, established on first use.
    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let attempt = tokio::time::timeout(
                    self.connect_timeout,
                    self.client.get_multiplexed_async_connection(),
                )
                .await;
                match attempt {
                    Ok(Ok(conn)) => Ok(conn),
                    Ok(Err(e)) => {
                        warn!(error = %e, "remote store connection failed");
                        Err(CacheError::Remote {
                            op: "connect",
                            reason: e.to_string(),
                        })
                    }
                    Err(_) => {
                        warn!(
                            timeout_ms = self.connect_timeout.as_millis() as u64,
                            "remote store connection timed out"
                        );
                        Err(CacheError::RemoteTimeout {
                            op: "connect",
                            timeout_ms: self.connect_timeout.as_millis() as u64,
                        })
                    }
                }
            })
            .await?;
        Ok(conn.clone())
    }

    /// Run a command under the per-call deadline.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Remote {
                op,
                reason: e.to_string(),
            }),
            Err(_) => Err(CacheError::RemoteTimeout {
                op,
                timeout_ms: self.command_timeout.as_millis() as u64,
            }),
        }
    }

    /// Map a set-collection failure. A store that lacks the primitive (or
    /// holds a list-encoded value under the key) reports
    /// `TagSetsUnsupported` so the tag index can switch strategies; other
    /// failures stay ordinary remote errors.
    fn classify_set_error(op: &'static str, err: &CacheError) -> CacheError {
        if let CacheError::Remote { reason, .. } = err {
            if reason.contains("unknown command") || reason.contains("WRONGTYPE") {
                return CacheError::TagSetsUnsupported;
            }
        }
        match err {
            CacheError::Remote { reason, .. } => CacheError::Remote {
                op,
                reason: reason.clone(),
            },
            other => other.clone(),
        }
    }
}

#[async_trait::async_trait]
impl RemoteStore for RedisRemoteStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        self.bounded("get", async move { conn.get(key).await }).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        self.bounded("set", async move { conn.set(key, value).await })
            .await
    }

    async fn expire(&self, key: &str, seconds: u64) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = self
            .bounded("expire", async move {
                conn.expire(key, seconds as i64).await
            })
            .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = self
            .bounded("del", async move { conn.del(key).await })
            .await?;
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> CacheResult<()> {
        let mut conn = self.connection().await?;
        let added: CacheResult<i64> = self
            .bounded("sadd", async move { conn.sadd(key, member).await })
            .await;
        match added {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::classify_set_error("sadd", &e)),
        }
    }

    async fn smembers(&self, key: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection().await?;
        self.bounded("smembers", async move { conn.smembers(key).await })
            .await
            .map_err(|e| Self::classify_set_error("smembers", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> CacheConfig {
        CacheConfig {
            redis_url: url.to_string(),
            command_timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_parses_url_without_connecting() {
        // No server is listening; construction must still succeed because
        // the connection is lazy.
        let store = RedisRemoteStore::new(&config_with_url("redis://127.0.0.1:1"));
        assert!(store.is_ok());
    }

    #[test]
    fn test_new_rejects_malformed_url() {
        let err = RedisRemoteStore::new(&config_with_url("not-a-url"))
            .err()
            .unwrap();
        assert!(matches!(err, CacheError::Remote { op: "connect", .. }));
    }

    #[tokio::test]
    async fn test_unreachable_store_degrades_within_deadline() {
        let store = RedisRemoteStore::new(&config_with_url("redis://127.0.0.1:1")).unwrap();
        let err = store.get("k").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_classify_set_error_unknown_command() {
        let err = CacheError::Remote {
            op: "sadd",
            reason: "An error was signalled by the server: unknown command 'SADD'".to_string(),
        };
        assert_eq!(
            RedisRemoteStore::classify_set_error("sadd", &err),
            CacheError::TagSetsUnsupported
        );
    }

    #[test]
    fn test_classify_set_error_keeps_transient_failures() {
        let err = CacheError::RemoteTimeout {
            op: "sadd",
            timeout_ms: 500,
        };
        assert_eq!(
            RedisRemoteStore::classify_set_error("sadd", &err),
            CacheError::RemoteTimeout {
                op: "sadd",
                timeout_ms: 500
            }
        );
    }
}
