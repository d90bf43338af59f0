//! Read-through cache of live designs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use labelworks_domain::{Design, DesignCache, DesignId, DesignRepository, DomainResult};
use tracing::debug;

use crate::{
    cache::{Cache, CacheConfig},
    error::Result,
    metrics::CacheStats,
    storage::{CacheStorage, MemoryStorage},
};

/// Caches designs loaded from a [`DesignRepository`]
///
/// Writers that replace a design's content (restores in particular) must call
/// [`DesignCache::invalidate`] so the next read goes back to the repository.
pub struct DesignReadCache {
    cache: Cache,
    ttl: Duration,
}

impl DesignReadCache {
    /// In-memory cache with the given entry TTL
    pub fn new(ttl: Duration) -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), ttl)
    }

    pub fn with_storage(storage: Arc<dyn CacheStorage>, ttl: Duration) -> Self {
        let config = CacheConfig {
            default_ttl: Some(ttl),
            enable_metrics: true,
        };
        Self {
            cache: Cache::with_storage(storage, config),
            ttl,
        }
    }

    /// Return the cached design, loading and caching it on a miss
    pub async fn get_or_load(
        &self,
        repository: &dyn DesignRepository,
        design_id: &DesignId,
    ) -> Result<Option<Design>> {
        let key = cache_key(design_id);
        if let Some(design) = self.cache.get::<Design>(&key).await? {
            return Ok(Some(design));
        }

        let loaded = repository.find_by_id(design_id).await?;
        if let Some(design) = &loaded {
            self.cache.set(&key, design.clone(), Some(self.ttl)).await?;
            debug!(design_id = %design_id, "Cached design after repository load");
        }
        Ok(loaded)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl DesignCache for DesignReadCache {
    async fn invalidate(&self, design_id: &DesignId) -> DomainResult<()> {
        self.cache.remove(&cache_key(design_id)).await?;
        debug!(design_id = %design_id, "Invalidated cached design");
        Ok(())
    }
}

fn cache_key(design_id: &DesignId) -> String {
    format!("design:{}", design_id)
}
