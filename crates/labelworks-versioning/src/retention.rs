//! Bounded history: keeps the most recent versions of each design

use std::sync::Arc;

use labelworks_domain::DesignId;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{error::VersioningResult, models::RetentionReport, store::VersionStore};

/// Deletes the oldest versions once a design exceeds `max_versions`
pub struct RetentionManager {
    store: Arc<dyn VersionStore>,
    max_versions: usize,
    enabled: bool,
}

impl RetentionManager {
    pub fn new(store: Arc<dyn VersionStore>, max_versions: usize, enabled: bool) -> Self {
        Self {
            store,
            max_versions: max_versions.max(1),
            enabled,
        }
    }

    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Prune so exactly the `max_versions` newest versions survive
    ///
    /// Idempotent: a design at or under the cap is left alone.
    pub async fn enforce_retention(&self, design_id: DesignId) -> VersioningResult<RetentionReport> {
        let numbers = self.store.version_numbers(&design_id).await?;
        let before = numbers.len();
        if before <= self.max_versions {
            debug!(design_id = %design_id, versions = before, "Retention not needed");
            return Ok(RetentionReport::untouched(design_id, before));
        }

        let cutoff = numbers[before - self.max_versions - 1];
        let deleted = self.store.delete_through(&design_id, cutoff).await?;

        info!(
            design_id = %design_id,
            cutoff,
            deleted,
            "Pruned old versions"
        );
        Ok(RetentionReport {
            design_id,
            before,
            deleted,
            cutoff: Some(cutoff),
        })
    }

    /// Run retention on a detached task
    ///
    /// Failures are logged and dropped. Returns `None` when retention is
    /// disabled.
    pub fn schedule(self: &Arc<Self>, design_id: DesignId) -> Option<JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            if let Err(e) = manager.enforce_retention(design_id).await {
                warn!(design_id = %design_id, error = %e, "Background retention failed");
            }
        }))
    }
}
