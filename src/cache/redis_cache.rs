/// Redis cache backend
///
/// Lets several site instances share resolved countries. Expiry is delegated
/// to Redis via `SETEX`.
use super::{Cache, CacheConfig};
use crate::error::{SiteError, SiteResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Redis cache client
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// Create a new cache client
    pub async fn new(config: CacheConfig) -> SiteResult<Self> {
        info!("Connecting to Redis at {}", config.redis_url);

        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            SiteError::Config(format!("Redis client creation failed: {}", e))
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to connect to Redis: {}", e);
            SiteError::Cache(format!("Redis connection failed: {}", e))
        })?;

        info!("Redis connection established");

        Ok(Self {
            connection,
            key_prefix: config.key_prefix,
        })
    }

    /// Build a cache key with prefix
    fn build_key(&self, key: &str) -> String {
        prefixed_key(&self.key_prefix, key)
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

/// Redis rejects a zero expiry; round sub-second TTLs up
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> SiteResult<Option<String>> {
        let cache_key = self.build_key(key);

        let mut conn = self.connection.clone();
        let result: Option<String> = conn.get(&cache_key).await.map_err(|e| {
            warn!("Redis GET failed for {}: {}", cache_key, e);
            SiteError::Cache(format!("Cache get failed: {}", e))
        })?;

        match &result {
            Some(_) => debug!("Cache HIT: {}", cache_key),
            None => debug!("Cache MISS: {}", cache_key),
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> SiteResult<()> {
        let cache_key = self.build_key(key);
        let ttl = ttl_seconds(ttl);

        debug!("Cache SET: {} (TTL: {}s)", cache_key, ttl);

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(&cache_key, value, ttl)
            .await
            .map_err(|e| {
                warn!("Redis SET failed for {}: {}", cache_key, e);
                SiteError::Cache(format!("Cache set failed: {}", e))
            })?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_key() {
        let config = CacheConfig::default();
        // Key building only; a live Redis is not available in unit tests
        assert_eq!(
            prefixed_key(&config.key_prefix, "country_1.2.3.4"),
            "site:country_1.2.3.4"
        );
    }

    #[test]
    fn test_ttl_seconds() {
        assert_eq!(ttl_seconds(Duration::from_secs(3600)), 3600);
        assert_eq!(ttl_seconds(Duration::from_millis(200)), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let config = CacheConfig {
            redis_url: "not a url".to_string(),
            ..CacheConfig::default()
        };

        assert!(matches!(
            RedisCache::new(config).await,
            Err(SiteError::Config(_))
        ));
    }
}
