//! In-memory design repository

use std::collections::HashMap;

use async_trait::async_trait;
use labelworks_domain::{Design, DesignId, DesignRepository, DomainResult};
use tokio::sync::RwLock;

/// Design repository backed by a map, for embedding and tests
#[derive(Default)]
pub struct InMemoryDesignRepository {
    designs: RwLock<HashMap<DesignId, Design>>,
}

impl InMemoryDesignRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a design, returning it if it existed
    pub async fn delete(&self, id: &DesignId) -> Option<Design> {
        self.designs.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.designs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.designs.read().await.is_empty()
    }
}

#[async_trait]
impl DesignRepository for InMemoryDesignRepository {
    async fn find_by_id(&self, id: &DesignId) -> DomainResult<Option<Design>> {
        Ok(self.designs.read().await.get(id).cloned())
    }

    async fn save(&self, design: &Design) -> DomainResult<()> {
        design.content.validate()?;
        self.designs.write().await.insert(design.id, design.clone());
        Ok(())
    }
}
