//! Cache configuration.
//!
//! Configuration is resolved once from environment variables before the
//! cache runtime is constructed; providers receive an immutable handle to
//! it. Defaults are production-safe: short remote deadlines, the local tier
//! enabled with a ten-second window, and a fourteen-day default stale age
//! for entries whose revalidate signal is absent.

use std::time::Duration;

/// Configuration for the cache tiers and the stale-while-revalidate policy.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Remote store URL. `rediss://` enables transport encryption;
    /// credentials and database index are carried in the URL and parsed at
    /// connection-build time.
    pub redis_url: String,

    /// Deadline applied to every individual remote call.
    pub command_timeout: Duration,

    /// Deadline for establishing the remote connection on first use.
    pub connect_timeout: Duration,

    /// Whether the process-local memoization tier is enabled. When false,
    /// every `get` falls through to the remote tier.
    pub in_memory_caching: bool,

    /// How long a local memoization entry stays visible, independent of the
    /// remote entry's own staleness.
    pub in_memory_caching_time: Duration,

    /// Soft-stale age in seconds applied when the host supplies no positive
    /// revalidate value.
    pub default_stale_age: u64,

    /// Production deployments hold entries in the remote store for twice
    /// their stale age; elsewhere the margin is 20%.
    pub production: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            command_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(5_000),
            in_memory_caching: true,
            in_memory_caching_time: Duration::from_millis(10_000),
            default_stale_age: 1_209_600, // 14 days
            production: false,
        }
    }
}

impl CacheConfig {
    /// Create a `CacheConfig` from environment variables.
    ///
    /// Environment variables:
    /// - `STRATUM_REDIS_URL`: remote store URL; falls back to `REDIS_URL`,
    ///   then `VALKEY_URL`, then `redis://localhost:6379`
    /// - `STRATUM_COMMAND_TIMEOUT_MS`: per-call remote deadline (default: 500)
    /// - `STRATUM_CONNECT_TIMEOUT_MS`: connection deadline (default: 5000)
    /// - `STRATUM_IN_MEMORY_CACHING`: "false" disables the local tier
    ///   (default: enabled)
    /// - `STRATUM_IN_MEMORY_CACHING_TIME_MS`: local tier TTL (default: 10000)
    /// - `STRATUM_DEFAULT_STALE_AGE`: fallback stale age in seconds
    ///   (default: 1209600, 14 days)
    /// - `STRATUM_PRODUCTION`: "true" selects the production expiry policy;
    ///   `NODE_ENV=production` from the host environment is also honored
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let redis_url = std::env::var("STRATUM_REDIS_URL")
            .or_else(|_| std::env::var("REDIS_URL"))
            .or_else(|_| std::env::var("VALKEY_URL"))
            .unwrap_or(defaults.redis_url);

        let command_timeout = env_millis("STRATUM_COMMAND_TIMEOUT_MS", defaults.command_timeout);
        let connect_timeout = env_millis("STRATUM_CONNECT_TIMEOUT_MS", defaults.connect_timeout);

        let in_memory_caching = std::env::var("STRATUM_IN_MEMORY_CACHING")
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(defaults.in_memory_caching);

        let in_memory_caching_time = env_millis(
            "STRATUM_IN_MEMORY_CACHING_TIME_MS",
            defaults.in_memory_caching_time,
        );

        let default_stale_age = std::env::var("STRATUM_DEFAULT_STALE_AGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|age| *age > 0)
            .unwrap_or(defaults.default_stale_age);

        let production = std::env::var("STRATUM_PRODUCTION")
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or_else(|_| {
                std::env::var("NODE_ENV").map(|s| s == "production").unwrap_or(false)
            });

        Self {
            redis_url,
            command_timeout,
            connect_timeout,
            in_memory_caching,
            in_memory_caching_time,
            default_stale_age,
            production,
        }
    }

    /// Resolve the soft-stale age for a write: the host's revalidate signal
    /// when positive, otherwise the configured default.
    pub fn effective_stale_age(&self, revalidate: Option<i64>) -> u64 {
        match revalidate {
            Some(r) if r > 0 => r as u64,
            _ => self.default_stale_age,
        }
    }

    /// Storage-level TTL for an entry with the given stale age, in seconds.
    ///
    /// Always strictly greater than `stale_age`: the gap is what lets a
    /// soft-stale entry survive in the remote store long enough for a
    /// concurrent regenerate-and-overwrite, instead of every reader missing
    /// at once.
    pub fn hard_expire_age(&self, stale_age: u64) -> u64 {
        if self.production {
            stale_age * 2
        } else {
            (stale_age as f64 * 1.2).ceil() as u64
        }
    }
}

fn env_millis(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.command_timeout, Duration::from_millis(500));
        assert_eq!(config.connect_timeout, Duration::from_millis(5_000));
        assert!(config.in_memory_caching);
        assert_eq!(config.in_memory_caching_time, Duration::from_millis(10_000));
        assert_eq!(config.default_stale_age, 1_209_600);
        assert!(!config.production);
    }

    #[test]
    fn test_effective_stale_age() {
        let config = CacheConfig::default();
        assert_eq!(config.effective_stale_age(Some(60)), 60);
        assert_eq!(config.effective_stale_age(Some(0)), 1_209_600);
        assert_eq!(config.effective_stale_age(Some(-5)), 1_209_600);
        assert_eq!(config.effective_stale_age(None), 1_209_600);
    }

    #[test]
    fn test_hard_expire_production_doubles() {
        let config = CacheConfig {
            production: true,
            ..Default::default()
        };
        assert_eq!(config.hard_expire_age(100), 200);
        assert_eq!(config.hard_expire_age(1), 2);
    }

    #[test]
    fn test_hard_expire_development_margin() {
        let config = CacheConfig::default();
        assert_eq!(config.hard_expire_age(100), 120);
        // Rounded up, so the TTL stays strictly greater than the stale age.
        assert_eq!(config.hard_expire_age(1), 2);
        assert_eq!(config.hard_expire_age(5), 6);
    }

    #[test]
    fn test_hard_expire_strictly_greater() {
        for production in [true, false] {
            let config = CacheConfig {
                production,
                ..Default::default()
            };
            for stale_age in [1, 2, 5, 60, 100, 1_209_600] {
                assert!(
                    config.hard_expire_age(stale_age) > stale_age,
                    "ttl must exceed stale age for stale_age={stale_age}"
                );
            }
        }
    }
}
