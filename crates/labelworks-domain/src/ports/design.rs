//! Design persistence port

use async_trait::async_trait;

use crate::{entities::Design, errors::DomainResult, value_objects::DesignId};

/// Read/write access to live designs, owned by the design CRUD service
#[async_trait]
pub trait DesignRepository: Send + Sync {
    /// Find design by ID
    async fn find_by_id(&self, id: &DesignId) -> DomainResult<Option<Design>>;

    /// Persist the design, replacing any stored copy
    async fn save(&self, design: &Design) -> DomainResult<()>;
}
