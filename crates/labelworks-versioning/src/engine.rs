//! Entry point tying hashing, numbering, restore, diff and retention together

use std::sync::Arc;

use labelworks_domain::{
    AuditEvent, AuditSink, Design, DesignCache, DesignId, DesignRepository, NoopAuditSink,
    NoopDesignCache, UserId,
};
use tracing::{debug, info, warn};

use crate::{
    config::VersioningConfig,
    diff::{self, VersionDiff},
    error::{VersioningError, VersioningResult},
    hasher,
    models::{
        normalize_custom_name, RestoreProvenance, RetentionReport, SnapshotOptions,
        SnapshotOutcome, Version, VersionDraft, VersionSummary,
    },
    numbering::NumberingAuthority,
    repository::InMemoryDesignRepository,
    restore::RestoreCoordinator,
    retention::RetentionManager,
    store::{FileVersionStore, InMemoryVersionStore, VersionStore},
};

/// Version history of label designs
///
/// ```no_run
/// use labelworks_versioning::{SnapshotOptions, VersionEngine};
/// use labelworks_domain::{Design, DesignContent, DesignRepository, UserId};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = VersionEngine::builder().build()?;
/// let author = UserId::from("designer-1");
/// let design = Design::new(author.clone(), DesignContent::blank("Jar", 60.0, 40.0))?;
/// engine.repository().save(&design).await?;
///
/// let outcome = engine
///     .create_snapshot(&design, &author, SnapshotOptions::default())
///     .await?;
/// println!("{}", outcome.user_message());
/// # Ok(())
/// # }
/// ```
pub struct VersionEngine {
    config: VersioningConfig,
    store: Arc<dyn VersionStore>,
    repository: Arc<dyn DesignRepository>,
    audit: Arc<dyn AuditSink>,
    numbering: NumberingAuthority,
    restorer: RestoreCoordinator,
    retention: Arc<RetentionManager>,
}

impl VersionEngine {
    pub fn builder() -> VersionEngineBuilder {
        VersionEngineBuilder::default()
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Design collaborator the engine reads and restores into
    pub fn repository(&self) -> &Arc<dyn DesignRepository> {
        &self.repository
    }

    /// Record the design's current state as a new version
    ///
    /// Returns [`SnapshotOutcome::Duplicate`] without writing when the state
    /// matches the most recent version. The first snapshot after a restore
    /// carries the restored version number in its hash, so it is always
    /// recorded.
    pub async fn create_snapshot(
        &self,
        design: &Design,
        author_id: &UserId,
        opts: SnapshotOptions,
    ) -> VersioningResult<SnapshotOutcome> {
        design.content.validate()?;
        let custom_name = normalize_custom_name(opts.custom_name)?;

        let recorded = self.restorer.restore_state(&design.id);
        let pending = opts
            .restored_from
            .or_else(|| recorded.as_ref().map(|p| p.restored_from));

        let content_hash = hasher::content_hash(&design.content, pending)?;
        let content = &design.content;
        let stored_hash = content_hash.clone();
        // An unchanged save after a restore-then-save inherits the latest tag
        let is_duplicate = move |latest: &Version| -> VersioningResult<bool> {
            let tag = pending.or(latest.restored_from);
            if tag == pending {
                Ok(stored_hash == latest.content_hash)
            } else {
                Ok(hasher::content_hash(content, tag)? == latest.content_hash)
            }
        };

        let draft = VersionDraft::from_design(
            design,
            author_id.clone(),
            content_hash,
            custom_name,
            pending,
        );
        let outcome = self.numbering.insert_next(draft, is_duplicate).await?;

        let SnapshotOutcome::Created(version) = &outcome else {
            debug!(design_id = %design.id, "Snapshot skipped, no changes");
            return Ok(outcome);
        };

        if let Some(provenance) = &recorded {
            self.restorer.mark_captured(&design.id, provenance);
        }
        info!(
            design_id = %design.id,
            version_number = version.version_number,
            author = %author_id,
            "Created version"
        );

        self.dispatch_audit(AuditEvent::version_created(
            design.id,
            author_id.clone(),
            version.version_number,
        ));
        self.retention.schedule(design.id);

        Ok(outcome)
    }

    /// Write version `version_number` back onto the live design
    ///
    /// Does not create a version.
    pub async fn restore(
        &self,
        design_id: DesignId,
        version_number: u32,
        author_id: &UserId,
    ) -> VersioningResult<Design> {
        let design = self
            .restorer
            .restore(design_id, version_number, author_id)
            .await?;
        self.dispatch_audit(AuditEvent::version_restored(
            design_id,
            author_id.clone(),
            version_number,
        ));
        Ok(design)
    }

    pub async fn get_version(&self, design_id: DesignId, version_number: u32) -> VersioningResult<Version> {
        self.store
            .get(&design_id, version_number)
            .await?
            .ok_or_else(|| VersioningError::version_not_found(design_id, version_number))
    }

    /// Surviving versions, newest first
    pub async fn list_versions(&self, design_id: DesignId) -> VersioningResult<Vec<VersionSummary>> {
        let versions = self.store.list(&design_id).await?;
        Ok(versions.iter().rev().map(Version::summary).collect())
    }

    /// Diff version `a` against version `b`
    pub async fn diff_versions(&self, design_id: DesignId, a: u32, b: u32) -> VersioningResult<VersionDiff> {
        let from = self.get_version(design_id, a).await?;
        let to = self.get_version(design_id, b).await?;
        Ok(diff::diff(&from, &to))
    }

    /// Diff version `version_number` against its nearest surviving predecessor
    ///
    /// `None` when it is the oldest surviving version.
    pub async fn diff_with_previous(
        &self,
        design_id: DesignId,
        version_number: u32,
    ) -> VersioningResult<Option<VersionDiff>> {
        let to = self.get_version(design_id, version_number).await?;
        let previous = self
            .store
            .version_numbers(&design_id)
            .await?
            .into_iter()
            .filter(|n| *n < version_number)
            .max();

        match previous {
            Some(n) => {
                let from = self.get_version(design_id, n).await?;
                Ok(Some(diff::diff(&from, &to)))
            }
            None => Ok(None),
        }
    }

    /// Set or clear a version's custom name
    pub async fn rename_version(
        &self,
        design_id: DesignId,
        version_number: u32,
        custom_name: Option<String>,
    ) -> VersioningResult<Version> {
        let custom_name = normalize_custom_name(custom_name)?;
        let version = self
            .store
            .rename(&design_id, version_number, custom_name)
            .await?;
        debug!(design_id = %design_id, version_number, "Renamed version");
        Ok(version)
    }

    /// Last restore not yet captured by a snapshot
    pub fn restore_state(&self, design_id: &DesignId) -> Option<RestoreProvenance> {
        self.restorer.restore_state(design_id)
    }

    pub fn is_modified_since_restore(&self, design: &Design) -> VersioningResult<bool> {
        self.restorer.is_modified_since_restore(design)
    }

    /// Run retention for a design now, on the caller's task
    pub async fn enforce_retention(&self, design_id: DesignId) -> VersioningResult<RetentionReport> {
        self.retention.enforce_retention(design_id).await
    }

    /// Delete every version of a design that no longer exists
    pub async fn purge_design(&self, design_id: DesignId) -> VersioningResult<usize> {
        let deleted = self.store.delete_design(&design_id).await?;
        self.restorer.forget(&design_id);
        info!(design_id = %design_id, deleted, "Purged design history");
        Ok(deleted)
    }

    fn dispatch_audit(&self, event: AuditEvent) {
        if !self.config.audit_enabled {
            return;
        }

        let audit = Arc::clone(&self.audit);
        tokio::spawn(async move {
            let action = event.action;
            let design_id = event.design_id;
            if let Err(e) = audit.record(event).await {
                warn!(design_id = %design_id, %action, error = %e, "Failed to record audit event");
            }
        });
    }
}

/// Builder for [`VersionEngine`]
///
/// Unset collaborators default to in-memory or no-op implementations; the
/// store defaults to a [`FileVersionStore`] when `storage_dir` is configured.
#[derive(Default)]
pub struct VersionEngineBuilder {
    config: VersioningConfig,
    store: Option<Arc<dyn VersionStore>>,
    repository: Option<Arc<dyn DesignRepository>>,
    audit: Option<Arc<dyn AuditSink>>,
    cache: Option<Arc<dyn DesignCache>>,
}

impl VersionEngineBuilder {
    pub fn config(mut self, config: VersioningConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn VersionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn DesignRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn DesignCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> VersioningResult<VersionEngine> {
        let config = self.config;
        config
            .validate()
            .map_err(|e| VersioningError::validation(e.to_string()))?;

        let store: Arc<dyn VersionStore> = match (self.store, &config.storage_dir) {
            (Some(store), _) => store,
            (None, Some(dir)) => Arc::new(FileVersionStore::open(dir.clone())?),
            (None, None) => Arc::new(InMemoryVersionStore::new()),
        };
        let repository: Arc<dyn DesignRepository> = match self.repository {
            Some(repository) => repository,
            None => Arc::new(InMemoryDesignRepository::new()),
        };
        let audit: Arc<dyn AuditSink> = match self.audit {
            Some(audit) => audit,
            None => Arc::new(NoopAuditSink),
        };
        let cache: Arc<dyn DesignCache> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(NoopDesignCache),
        };

        Ok(VersionEngine {
            numbering: NumberingAuthority::new(
                Arc::clone(&store),
                config.numbering_retries,
                config.transaction_timeout(),
            ),
            restorer: RestoreCoordinator::new(Arc::clone(&store), Arc::clone(&repository), cache),
            retention: Arc::new(RetentionManager::new(
                Arc::clone(&store),
                config.max_versions_per_design,
                config.retention_enabled,
            )),
            store,
            repository,
            audit,
            config,
        })
    }
}
