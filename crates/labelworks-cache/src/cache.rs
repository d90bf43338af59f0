//! TTL cache over a pluggable storage backend

use std::{sync::Arc, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{CacheError, Result},
    metrics::{CacheMetrics, CacheStats},
    storage::{CacheEntry, CacheStorage, MemoryStorage},
};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl: Option<Duration>,
    /// Whether hit/miss counters are maintained
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Some(Duration::from_secs(300)),
            enable_metrics: true,
        }
    }
}

/// Typed cache storing TTL-stamped entries as JSON
pub struct Cache {
    storage: Arc<dyn CacheStorage>,
    config: CacheConfig,
    metrics: CacheMetrics,
}

impl Cache {
    /// Create an in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), CacheConfig::default())
    }

    /// Create a cache over the given storage
    pub fn with_storage(storage: Arc<dyn CacheStorage>, config: CacheConfig) -> Self {
        Self {
            storage,
            config,
            metrics: CacheMetrics::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store a value, using the default TTL when `ttl` is `None`
    pub async fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + Clone,
    {
        validate_key(key)?;
        let entry = CacheEntry::new(value, ttl.or(self.config.default_ttl));
        let json = serde_json::to_value(&entry).map_err(|e| CacheError::Serialization {
            message: e.to_string(),
        })?;

        self.storage.set(key, &json).await?;
        if self.config.enable_metrics {
            self.metrics.record_set();
        }
        debug!(key, "Cached value");
        Ok(())
    }

    /// Fetch a live value; expired entries are evicted and reported as a miss
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Clone,
    {
        validate_key(key)?;
        let Some(json) = self.storage.get(key).await? else {
            self.record_miss();
            return Ok(None);
        };

        let entry: CacheEntry<T> = match serde_json::from_value(json) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                self.storage.remove(key).await?;
                self.record_miss();
                return Err(CacheError::Deserialization {
                    message: e.to_string(),
                });
            }
        };

        if entry.is_expired() {
            self.storage.remove(key).await?;
            self.record_miss();
            return Ok(None);
        }

        if self.config.enable_metrics {
            self.metrics.record_hit();
        }
        Ok(Some(entry.data))
    }

    /// Remove a key, returning whether it was present
    pub async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let removed = self.storage.remove(key).await?;
        if self.config.enable_metrics {
            self.metrics.record_invalidation();
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }

    pub async fn len(&self) -> Result<usize> {
        self.storage.len().await
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.stats()
    }

    fn record_miss(&self) {
        if self.config.enable_metrics {
            self.metrics.record_miss();
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = Cache::new();
        cache.set("a", "value".to_string(), None).await.unwrap();
        let got: Option<String> = cache.get("a").await.unwrap();
        assert_eq!(got.as_deref(), Some("value"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_miss() {
        let cache = Cache::new();
        let got: Option<String> = cache.get("nope").await.unwrap();
        assert!(got.is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_evicted() {
        let cache = Cache::new();
        cache
            .set("short", 1u32, Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let got: Option<u32> = cache.get("short").await.unwrap();
        assert!(got.is_none());
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_and_empty_key() {
        let cache = Cache::new();
        cache.set("k", 5u8, None).await.unwrap();
        assert!(cache.remove("k").await.unwrap());
        assert!(!cache.remove("k").await.unwrap());
        assert!(matches!(
            cache.remove("").await,
            Err(CacheError::InvalidKey { .. })
        ));
    }
}
