//! File-backed snapshot store
//!
//! Each design's history lives in `<storage_dir>/<design_id>.json`, rewritten
//! atomically on every change and loaded back when the store is opened.
//! File writes run on the blocking pool, serialized per design by the
//! design's write lock.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use labelworks_common::json_store::{list_json_files, load_json, remove_json, save_json_atomic};
use labelworks_common::JsonStoreError;
use labelworks_domain::DesignId;
use tracing::{debug, info};

use super::memory::{DesignHistory, HistoryJournal, InMemoryVersionStore};
use super::{StoreError, StoreResult, VersionStore, VersionTransaction};
use crate::models::Version;

struct JsonHistoryJournal {
    dir: PathBuf,
}

impl JsonHistoryJournal {
    fn path_for(&self, design_id: &DesignId) -> PathBuf {
        self.dir.join(format!("{}.json", design_id))
    }
}

#[async_trait]
impl HistoryJournal for JsonHistoryJournal {
    async fn write(&self, history: DesignHistory) -> StoreResult<()> {
        let path = self.path_for(&history.design_id);
        let design_id = history.design_id;
        let versions = history.versions.len();
        tokio::task::spawn_blocking(move || save_json_atomic(path, &history))
            .await
            .map_err(|e| StoreError::Background(e.to_string()))??;
        debug!(design_id = %design_id, versions, "Wrote design history");
        Ok(())
    }

    async fn remove(&self, design_id: DesignId) -> StoreResult<()> {
        let path = self.path_for(&design_id);
        tokio::task::spawn_blocking(move || remove_json(path))
            .await
            .map_err(|e| StoreError::Background(e.to_string()))??;
        Ok(())
    }
}

/// Version store persisted as one JSON document per design
pub struct FileVersionStore {
    dir: PathBuf,
    inner: InMemoryVersionStore,
}

impl FileVersionStore {
    /// Open the store, loading every history found in `dir`
    ///
    /// A missing directory is treated as empty and created on first write.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        let mut histories = Vec::new();

        for path in list_json_files(&dir)? {
            let mut history: DesignHistory = load_json(&path).map_err(|e| match e {
                JsonStoreError::Serialize(err) => StoreError::Corrupt {
                    path: path.display().to_string(),
                    reason: err.to_string(),
                },
                other => StoreError::Io(other),
            })?;
            history.normalize();
            histories.push(history);
        }

        info!(
            dir = %dir.display(),
            designs = histories.len(),
            "Opened file version store"
        );

        let journal: Arc<dyn HistoryJournal> = Arc::new(JsonHistoryJournal { dir: dir.clone() });
        Ok(Self {
            dir,
            inner: InMemoryVersionStore::with_journal(histories, Some(journal)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl VersionStore for FileVersionStore {
    async fn begin(&self, design_id: DesignId) -> StoreResult<Box<dyn VersionTransaction>> {
        self.inner.begin(design_id).await
    }

    async fn latest(&self, design_id: &DesignId) -> StoreResult<Option<Version>> {
        self.inner.latest(design_id).await
    }

    async fn get(&self, design_id: &DesignId, version_number: u32) -> StoreResult<Option<Version>> {
        self.inner.get(design_id, version_number).await
    }

    async fn list(&self, design_id: &DesignId) -> StoreResult<Vec<Version>> {
        self.inner.list(design_id).await
    }

    async fn count(&self, design_id: &DesignId) -> StoreResult<usize> {
        self.inner.count(design_id).await
    }

    async fn version_numbers(&self, design_id: &DesignId) -> StoreResult<Vec<u32>> {
        self.inner.version_numbers(design_id).await
    }

    async fn delete_through(&self, design_id: &DesignId, cutoff: u32) -> StoreResult<usize> {
        self.inner.delete_through(design_id, cutoff).await
    }

    async fn rename(
        &self,
        design_id: &DesignId,
        version_number: u32,
        custom_name: Option<String>,
    ) -> StoreResult<Version> {
        self.inner.rename(design_id, version_number, custom_name).await
    }

    async fn delete_design(&self, design_id: &DesignId) -> StoreResult<usize> {
        self.inner.delete_design(design_id).await
    }
}
