//! Cache storage backends

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;

/// Cache entry metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T: Clone> {
    /// The cached data
    pub data: T,
    /// When the entry was created
    pub created_at: SystemTime,
    /// When the entry expires (optional)
    pub expires_at: Option<SystemTime>,
}

impl<T: Clone> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(data: T, ttl: Option<std::time::Duration>) -> Self {
        let created_at = SystemTime::now();
        let expires_at = ttl.map(|t| created_at + t);

        Self {
            data,
            created_at,
            expires_at,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires| SystemTime::now() > expires)
            .unwrap_or(false)
    }
}

/// Cache storage trait
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Store a value
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;

    /// Retrieve a value
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Remove a value
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Clear all entries
    async fn clear(&self) -> Result<()>;

    /// Get number of entries
    async fn len(&self) -> Result<usize>;
}

/// In-memory cache storage
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl MemoryStorage {
    /// Create new in-memory storage
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write().await;
        Ok(data.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.data.write().await;
        data.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let data = self.data.read().await;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set("k", &serde_json::json!({"v": 1})).await.unwrap();
        assert_eq!(storage.len().await.unwrap(), 1);
        assert_eq!(storage.get("k").await.unwrap().unwrap()["v"], 1);
        assert!(storage.remove("k").await.unwrap());
        assert!(!storage.remove("k").await.unwrap());
        assert!(storage.get("k").await.unwrap().is_none());
    }

    #[test]
    fn test_entry_expiry() {
        let fresh = CacheEntry::new(1u8, Some(Duration::from_secs(60)));
        assert!(!fresh.is_expired());

        let mut stale = CacheEntry::new(1u8, Some(Duration::from_secs(60)));
        stale.expires_at = Some(SystemTime::now() - Duration::from_secs(1));
        assert!(stale.is_expired());

        assert!(!CacheEntry::new(1u8, None).is_expired());
    }
}
