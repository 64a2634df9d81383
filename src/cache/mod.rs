/// Country cache
///
/// Maps `country_<address>` keys to uppercase ISO country codes. Entries
/// expire after their TTL; expiry is enforced by the backend at read time.
///
/// Two backends share one capability set:
/// - in-process map (single instance deployments)
/// - Redis (shared between instances)
pub mod memory;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::error::{SiteError, SiteResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Cache backend trait
///
/// Implementations must be safe for concurrent use without any lock held by
/// the caller. Concurrent writes to one key are last-write-wins.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live value; expired or missing keys return `None`
    async fn get(&self, key: &str) -> SiteResult<Option<String>>;

    /// Store a value that stays valid for `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> SiteResult<()>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl std::str::FromStr for CacheBackend {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(SiteError::Config(format!("Unknown cache backend: {}", other))),
        }
    }
}

/// Cache layer configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backing store (default: memory)
    pub backend: CacheBackend,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub redis_url: String,

    /// Key prefix for Redis entries (default: "site:")
    pub key_prefix: String,

    /// TTL for country entries in seconds (default: 3600 = 1 hour)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "site:".to_string(),
            ttl_secs: 3600,
        }
    }
}

impl CacheConfig {
    /// Load from a variable source (see `ServerConfig::from_env`)
    pub fn from_lookup<F>(var: F) -> SiteResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match var("CACHE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => CacheBackend::Memory,
        };

        Ok(Self {
            backend,
            redis_url: var("REDIS_URL").unwrap_or_else(|| "redis://localhost:6379".to_string()),
            key_prefix: var("CACHE_KEY_PREFIX").unwrap_or_else(|| "site:".to_string()),
            ttl_secs: var("CACHE_TTL")
                .unwrap_or_else(|| "3600".to_string())
                .parse()
                .map_err(|_| SiteError::Config("Invalid CACHE_TTL".to_string()))?,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Build the configured cache backend
pub async fn connect(config: &CacheConfig) -> SiteResult<Arc<dyn Cache>> {
    let cache: Arc<dyn Cache> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Redis => Arc::new(RedisCache::new(config.clone()).await?),
    };

    info!(backend = cache.name(), ttl_secs = config.ttl_secs, "Country cache ready");
    Ok(cache)
}

/// Cache key for an address
pub fn country_key(address: &str) -> String {
    format!("country_{}", address)
}
