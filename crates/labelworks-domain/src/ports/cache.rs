//! Read-cache invalidation port

use async_trait::async_trait;

use crate::{errors::DomainResult, value_objects::DesignId};

/// Cache fronting reads of the current design
#[async_trait]
pub trait DesignCache: Send + Sync {
    /// Drop any cached copy of the design
    async fn invalidate(&self, design_id: &DesignId) -> DomainResult<()>;
}

/// Cache port for deployments without a read cache
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDesignCache;

#[async_trait]
impl DesignCache for NoopDesignCache {
    async fn invalidate(&self, _design_id: &DesignId) -> DomainResult<()> {
        Ok(())
    }
}
