/// In-process cache backend
use super::Cache;
use crate::error::SiteResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Entry count above which `set` drops expired entries
const PURGE_THRESHOLD: usize = 4096;

/// Map-backed cache with read-time expiry
///
/// There is no background sweep. An expired key is dropped when it is read,
/// and every expired entry is dropped by a `set` that finds the map above
/// the purge threshold.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    purge_threshold: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            purge_threshold: PURGE_THRESHOLD,
        }
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_purge_threshold(purge_threshold: usize) -> Self {
        Self {
            purge_threshold,
            ..Self::default()
        }
    }

    /// Number of stored entries, live or expired
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> SiteResult<Option<String>> {
        let now = Instant::now();

        match self.entries.read().await.get(key) {
            Some(entry) if entry.expires_at > now => {
                debug!("Cache HIT: {}", key);
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => {}
            None => {
                debug!("Cache MISS: {}", key);
                return Ok(None);
            }
        }

        debug!("Cache EXPIRED: {}", key);
        let mut entries = self.entries.write().await;
        // A writer may have refreshed the key since the read lock was released
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> SiteResult<()> {
        debug!("Cache SET: {} (TTL: {}s)", key, ttl.as_secs());

        let now = Instant::now();
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: now + ttl,
        };

        let mut entries = self.entries.write().await;
        if entries.len() >= self.purge_threshold {
            let before = entries.len();
            entries.retain(|_, e| e.expires_at > now);
            debug!("Cache PURGE: dropped {} expired entries", before - entries.len());
        }
        entries.insert(key.to_string(), entry);

        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache
            .set("country_1.2.3.4", "US", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("country_1.2.3.4").await.unwrap(),
            Some("US".to_string())
        );
        assert_eq!(cache.get("country_5.6.7.8").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = MemoryCache::new();

        cache
            .set("country_1.2.3.4", "DE", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.get("country_1.2.3.4").await.unwrap(), None);
        // Reading the expired key drops it
        assert_eq!(cache.len().await, 0);

        cache
            .set("country_1.2.3.4", "FR", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            cache.get("country_1.2.3.4").await.unwrap(),
            Some("FR".to_string())
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_purges_expired_entries_above_threshold() {
        let cache = MemoryCache::with_purge_threshold(4);

        for i in 0..3 {
            cache
                .set(&format!("country_10.0.0.{}", i), "DE", Duration::from_millis(20))
                .await
                .unwrap();
        }
        cache
            .set("country_10.0.1.1", "FR", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 4);

        tokio::time::sleep(Duration::from_millis(60)).await;

        // Never read again, so only the purge can drop them
        cache
            .set("country_10.0.1.2", "US", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);
        assert_eq!(
            cache.get("country_10.0.1.1").await.unwrap(),
            Some("FR".to_string())
        );
    }

    #[tokio::test]
    async fn test_below_threshold_set_keeps_entries() {
        let cache = MemoryCache::with_purge_threshold(100);

        cache.set("a", "DE", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.set("b", "FR", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("k", "AA", ttl).await.unwrap();
        cache.set("k", "BB", ttl).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("BB".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(MemoryCache::new());
        let ttl = Duration::from_secs(60);

        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = format!("country_10.0.0.{}", i % 4);
                cache.set(&key, "NL", ttl).await.unwrap();
                cache.get(&key).await.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some("NL".to_string()));
        }
        assert_eq!(cache.len().await, 4);
    }
}
