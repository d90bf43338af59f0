//! Per-design version number allocation

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    error::{VersioningError, VersioningResult},
    models::{SnapshotOutcome, Version, VersionDraft},
    store::{StoreError, VersionStore, VersionTransaction},
};

/// Allocates `max + 1` and inserts the version inside one store transaction
///
/// The transaction holds the design's exclusive lock, so concurrent snapshots
/// of the same design are numbered one after another while other designs
/// proceed in parallel. The duplicate check runs under the same lock, against
/// the version that is latest at that moment.
pub struct NumberingAuthority {
    store: Arc<dyn VersionStore>,
    retries: u32,
    timeout: Duration,
}

impl NumberingAuthority {
    pub fn new(store: Arc<dyn VersionStore>, retries: u32, timeout: Duration) -> Self {
        Self {
            store,
            retries,
            timeout,
        }
    }

    /// Number and persist a draft unless `is_duplicate` accepts the latest version
    ///
    /// A unique-constraint violation re-runs the read-max/insert up to
    /// `retries` more times before giving up with
    /// [`VersioningError::NumberingConflict`]. Each attempt is bounded by the
    /// transaction timeout up to the commit; a timed-out attempt is rolled
    /// back. A started commit always runs to completion.
    pub async fn insert_next<F>(
        &self,
        draft: VersionDraft,
        is_duplicate: F,
    ) -> VersioningResult<SnapshotOutcome>
    where
        F: Fn(&Version) -> VersioningResult<bool> + Send + Sync,
    {
        let design_id = draft.design_id;
        let attempts = self.retries + 1;

        for attempt in 1..=attempts {
            let staged = tokio::time::timeout(self.timeout, self.stage(draft.clone(), &is_duplicate))
                .await
                .map_err(|_| VersioningError::Timeout {
                    operation: "version transaction",
                    timeout_ms: self.timeout.as_millis() as u64,
                })??;

            match staged {
                Staged::Duplicate => return Ok(SnapshotOutcome::Duplicate),
                Staged::Taken => {
                    warn!(design_id = %design_id, attempt, "Version number already taken")
                }
                Staged::Ready(tx, version) => {
                    tx.commit().await?;
                    debug!(
                        design_id = %version.design_id,
                        version_number = version.version_number,
                        "Allocated version number"
                    );
                    return Ok(SnapshotOutcome::Created(version));
                }
            }
        }

        Err(VersioningError::NumberingConflict {
            design_id,
            attempts,
        })
    }

    /// Lock, check for a duplicate and stage `max + 1`
    async fn stage<F>(&self, draft: VersionDraft, is_duplicate: &F) -> VersioningResult<Staged>
    where
        F: Fn(&Version) -> VersioningResult<bool> + Send + Sync,
    {
        let mut tx = self.store.begin(draft.design_id).await?;

        if let Some(latest) = self.store.latest(&draft.design_id).await? {
            if is_duplicate(&latest)? {
                debug!(
                    design_id = %draft.design_id,
                    latest = latest.version_number,
                    "Content matches latest version"
                );
                return Ok(Staged::Duplicate);
            }
        }

        let next = tx.max_version_number().await?.saturating_add(1);
        let version = draft.into_version(next);
        match tx.insert(version.clone()).await {
            Ok(()) => Ok(Staged::Ready(tx, version)),
            Err(StoreError::UniqueViolation { .. }) => Ok(Staged::Taken),
            Err(err) => Err(err.into()),
        }
    }
}

/// Result of one attempt before commit
enum Staged {
    Duplicate,
    /// The chosen number was taken; retry
    Taken,
    Ready(Box<dyn VersionTransaction>, Version),
}
