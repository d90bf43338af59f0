//! Non-destructive restore of a design to a past version

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use labelworks_domain::{Design, DesignCache, DesignId, DesignRepository, DomainError, UserId};
use tracing::{info, warn};

use crate::{
    error::{VersioningError, VersioningResult},
    hasher,
    models::RestoreProvenance,
    store::VersionStore,
};

/// Writes a stored version's content back onto the live design
///
/// A restore never allocates a version number. It leaves a
/// [`RestoreProvenance`] behind so the next snapshot is tagged with the
/// version it came from, and so callers can tell whether the design has been
/// edited since.
pub struct RestoreCoordinator {
    store: Arc<dyn VersionStore>,
    repository: Arc<dyn DesignRepository>,
    cache: Arc<dyn DesignCache>,
    provenance: DashMap<DesignId, RestoreProvenance>,
}

impl RestoreCoordinator {
    pub fn new(
        store: Arc<dyn VersionStore>,
        repository: Arc<dyn DesignRepository>,
        cache: Arc<dyn DesignCache>,
    ) -> Self {
        Self {
            store,
            repository,
            cache,
            provenance: DashMap::new(),
        }
    }

    /// Overwrite the design's versionable fields with version `version_number`
    pub async fn restore(
        &self,
        design_id: DesignId,
        version_number: u32,
        restored_by: &UserId,
    ) -> VersioningResult<Design> {
        let version = self
            .store
            .get(&design_id, version_number)
            .await?
            .ok_or_else(|| VersioningError::version_not_found(design_id, version_number))?;

        let mut design = self
            .repository
            .find_by_id(&design_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Design", design_id))?;

        let content_hash = hasher::content_hash(&version.content, None)?;
        design.apply_content(version.content);
        self.repository.save(&design).await?;

        self.provenance.insert(
            design_id,
            RestoreProvenance {
                restored_from: version_number,
                restored_by: restored_by.clone(),
                restored_at: Utc::now(),
                content_hash,
            },
        );

        if let Err(e) = self.cache.invalidate(&design_id).await {
            warn!(design_id = %design_id, error = %e, "Failed to invalidate design cache after restore");
        }

        info!(
            design_id = %design_id,
            restored_from = version_number,
            restored_by = %restored_by,
            "Restored design"
        );
        Ok(design)
    }

    /// Provenance of the last restore not yet captured by a snapshot
    pub fn restore_state(&self, design_id: &DesignId) -> Option<RestoreProvenance> {
        self.provenance.get(design_id).map(|p| p.value().clone())
    }

    /// Whether the design was edited after its last restore
    ///
    /// `false` when there is no outstanding restore.
    pub fn is_modified_since_restore(&self, design: &Design) -> VersioningResult<bool> {
        let Some(provenance) = self.restore_state(&design.id) else {
            return Ok(false);
        };
        Ok(hasher::content_hash(&design.content, None)? != provenance.content_hash)
    }

    /// Forget `provenance` once a snapshot has recorded it
    ///
    /// A newer restore that landed in the meantime is left in place.
    pub fn mark_captured(&self, design_id: &DesignId, provenance: &RestoreProvenance) {
        self.provenance
            .remove_if(design_id, |_, current| current == provenance);
    }

    pub fn forget(&self, design_id: &DesignId) {
        self.provenance.remove(design_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionDraft;
    use crate::repository::InMemoryDesignRepository;
    use crate::store::InMemoryVersionStore;
    use async_trait::async_trait;
    use labelworks_domain::{DesignContent, DomainResult, NoopDesignCache};

    struct FailingCache;

    #[async_trait]
    impl DesignCache for FailingCache {
        async fn invalidate(&self, _design_id: &DesignId) -> DomainResult<()> {
            Err(DomainError::Unavailable {
                service: "cache".to_string(),
                reason: "down".to_string(),
            })
        }
    }

    async fn setup(cache: Arc<dyn DesignCache>) -> (RestoreCoordinator, Arc<InMemoryDesignRepository>, Design) {
        let store = Arc::new(InMemoryVersionStore::new());
        let repo = Arc::new(InMemoryDesignRepository::new());
        let mut design =
            Design::new(UserId::from("u1"), DesignContent::blank("Original", 50.0, 25.0)).unwrap();
        repo.save(&design).await.unwrap();

        let draft = VersionDraft::from_design(&design, UserId::from("u1"), "h1".into(), None, None);
        let mut tx = store.begin(design.id).await.unwrap();
        tx.insert(draft.into_version(1)).await.unwrap();
        tx.commit().await.unwrap();

        let mut edited = design.content.clone();
        edited.name = "Edited".to_string();
        design.apply_content(edited);
        repo.save(&design).await.unwrap();

        (RestoreCoordinator::new(store, repo.clone(), cache), repo, design)
    }

    #[tokio::test]
    async fn test_restore_overwrites_live_design() {
        let (coordinator, repo, design) = setup(Arc::new(NoopDesignCache)).await;
        let restored = coordinator.restore(design.id, 1, &UserId::from("u2")).await.unwrap();
        assert_eq!(restored.content.name, "Original");

        let stored = repo.find_by_id(&design.id).await.unwrap().unwrap();
        assert_eq!(stored.content.name, "Original");

        let state = coordinator.restore_state(&design.id).unwrap();
        assert_eq!(state.restored_from, 1);
        assert_eq!(state.restored_by, UserId::from("u2"));
        assert!(!coordinator.is_modified_since_restore(&stored).unwrap());
    }

    #[tokio::test]
    async fn test_edit_after_restore_is_dirty() {
        let (coordinator, _repo, design) = setup(Arc::new(NoopDesignCache)).await;
        let mut restored = coordinator.restore(design.id, 1, &UserId::from("u1")).await.unwrap();
        restored.content.width = 55.0;
        assert!(coordinator.is_modified_since_restore(&restored).unwrap());
    }

    #[tokio::test]
    async fn test_missing_version() {
        let (coordinator, _repo, design) = setup(Arc::new(NoopDesignCache)).await;
        let err = coordinator.restore(design.id, 9, &UserId::from("u1")).await.unwrap_err();
        assert!(matches!(err, VersioningError::VersionNotFound { version_number: 9, .. }));
        assert!(coordinator.restore_state(&design.id).is_none());
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_fail_restore() {
        let (coordinator, _repo, design) = setup(Arc::new(FailingCache)).await;
        assert!(coordinator.restore(design.id, 1, &UserId::from("u1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mark_captured_keeps_newer_restore() {
        let (coordinator, _repo, design) = setup(Arc::new(NoopDesignCache)).await;
        coordinator.restore(design.id, 1, &UserId::from("u1")).await.unwrap();
        let first = coordinator.restore_state(&design.id).unwrap();
        coordinator.restore(design.id, 1, &UserId::from("u2")).await.unwrap();

        coordinator.mark_captured(&design.id, &first);
        assert_eq!(
            coordinator.restore_state(&design.id).unwrap().restored_by,
            UserId::from("u2")
        );
    }
}
