//! In-memory snapshot store

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use labelworks_domain::DesignId;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{StoreError, StoreResult, VersionStore, VersionTransaction};
use crate::models::Version;

/// One design's version rows, ascending by number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignHistory {
    pub design_id: DesignId,
    /// Highest number ever allocated; survives pruning so numbers are never reused
    pub high_water: u32,
    pub versions: Vec<Version>,
}

impl DesignHistory {
    pub fn new(design_id: DesignId) -> Self {
        Self {
            design_id,
            high_water: 0,
            versions: Vec::new(),
        }
    }

    fn push(&mut self, version: Version) {
        self.high_water = self.high_water.max(version.version_number);
        self.versions.push(version);
    }

    fn get(&self, version_number: u32) -> Option<&Version> {
        self.versions
            .binary_search_by_key(&version_number, |v| v.version_number)
            .ok()
            .map(|idx| &self.versions[idx])
    }

    /// Restore ordering and the high-water mark after loading from disk
    pub(crate) fn normalize(&mut self) {
        self.versions.sort_by_key(|v| v.version_number);
        if let Some(last) = self.versions.last() {
            self.high_water = self.high_water.max(last.version_number);
        }
    }
}

/// Receives the new state of a history before it becomes visible
#[async_trait]
pub(crate) trait HistoryJournal: Send + Sync {
    async fn write(&self, history: DesignHistory) -> StoreResult<()>;
    async fn remove(&self, design_id: DesignId) -> StoreResult<()>;
}

struct Shared {
    histories: DashMap<DesignId, DesignHistory>,
    locks: DashMap<DesignId, Arc<Mutex<()>>>,
    journal: Option<Arc<dyn HistoryJournal>>,
}

impl Shared {
    /// Wait for the design's write lock
    async fn lock(&self, design_id: DesignId) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(design_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Drop the design's lock entry unless it is held or awaited
    fn release_lock(&self, design_id: &DesignId) {
        self.locks
            .remove_if(design_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn read<R>(&self, design_id: &DesignId, f: impl FnOnce(&DesignHistory) -> R) -> Option<R> {
        self.histories.get(design_id).map(|history| f(&*history))
    }

    /// Apply `f` to a copy of the history, journal the copy, then publish it
    ///
    /// Callers hold the design's write lock. No map guard is held while the
    /// journal runs. Returns `None` for a design without history unless
    /// `create` is set.
    async fn update<R, F>(&self, design_id: DesignId, create: bool, f: F) -> StoreResult<Option<R>>
    where
        F: FnOnce(&mut DesignHistory) -> StoreResult<R> + Send,
        R: Send,
    {
        let current = self.histories.get(&design_id).map(|h| h.value().clone());
        let mut next = match current {
            Some(history) => history,
            None if create => DesignHistory::new(design_id),
            None => return Ok(None),
        };

        let result = f(&mut next)?;
        if let Some(journal) = &self.journal {
            journal.write(next.clone()).await?;
        }
        self.histories.insert(design_id, next);
        Ok(Some(result))
    }
}

/// Run [`Shared::update`] to completion, then release `guard`
///
/// With a journal the update runs on its own task: a caller that stops
/// waiting must not release the lock while a write is in flight or leave
/// the journal ahead of memory.
async fn apply<R, F>(
    shared: &Arc<Shared>,
    guard: OwnedMutexGuard<()>,
    design_id: DesignId,
    create: bool,
    f: F,
) -> StoreResult<Option<R>>
where
    F: FnOnce(&mut DesignHistory) -> StoreResult<R> + Send + 'static,
    R: Send + 'static,
{
    if shared.journal.is_none() {
        let result = shared.update(design_id, create, f).await;
        drop(guard);
        return result;
    }

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        let result = shared.update(design_id, create, f).await;
        drop(guard);
        result
    })
    .await
    .map_err(|e| StoreError::Background(e.to_string()))?
}

/// Version store held entirely in memory
///
/// Also the engine behind [`FileVersionStore`](super::FileVersionStore),
/// which attaches a journal that mirrors every change to disk.
#[derive(Clone)]
pub struct InMemoryVersionStore {
    shared: Arc<Shared>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::with_journal(Vec::new(), None)
    }

    pub(crate) fn with_journal(
        histories: Vec<DesignHistory>,
        journal: Option<Arc<dyn HistoryJournal>>,
    ) -> Self {
        let map = DashMap::new();
        for history in histories {
            map.insert(history.design_id, history);
        }
        Self {
            shared: Arc::new(Shared {
                histories: map,
                locks: DashMap::new(),
                journal,
            }),
        }
    }

    /// Number of designs with at least one stored history entry
    pub fn design_count(&self) -> usize {
        self.shared.histories.len()
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn begin(&self, design_id: DesignId) -> StoreResult<Box<dyn VersionTransaction>> {
        let guard = self.shared.lock(design_id).await;
        debug!(design_id = %design_id, "Acquired design transaction lock");

        Ok(Box::new(MemoryTransaction {
            design_id,
            shared: Arc::clone(&self.shared),
            staged: Vec::new(),
            guard,
        }))
    }

    async fn latest(&self, design_id: &DesignId) -> StoreResult<Option<Version>> {
        Ok(self
            .shared
            .read(design_id, |h| h.versions.last().cloned())
            .flatten())
    }

    async fn get(&self, design_id: &DesignId, version_number: u32) -> StoreResult<Option<Version>> {
        Ok(self
            .shared
            .read(design_id, |h| h.get(version_number).cloned())
            .flatten())
    }

    async fn list(&self, design_id: &DesignId) -> StoreResult<Vec<Version>> {
        Ok(self
            .shared
            .read(design_id, |h| h.versions.clone())
            .unwrap_or_default())
    }

    async fn count(&self, design_id: &DesignId) -> StoreResult<usize> {
        Ok(self
            .shared
            .read(design_id, |h| h.versions.len())
            .unwrap_or(0))
    }

    async fn version_numbers(&self, design_id: &DesignId) -> StoreResult<Vec<u32>> {
        Ok(self
            .shared
            .read(design_id, |h| h.versions.iter().map(|v| v.version_number).collect())
            .unwrap_or_default())
    }

    async fn delete_through(&self, design_id: &DesignId, cutoff: u32) -> StoreResult<usize> {
        let guard = self.shared.lock(*design_id).await;
        let deleted = apply(&self.shared, guard, *design_id, false, move |history| {
            let before = history.versions.len();
            history.versions.retain(|v| v.version_number > cutoff);
            Ok(before - history.versions.len())
        })
        .await?;
        Ok(deleted.unwrap_or(0))
    }

    async fn rename(
        &self,
        design_id: &DesignId,
        version_number: u32,
        custom_name: Option<String>,
    ) -> StoreResult<Version> {
        let design_id = *design_id;
        let guard = self.shared.lock(design_id).await;
        let renamed = apply(&self.shared, guard, design_id, false, move |history| {
            let idx = history
                .versions
                .binary_search_by_key(&version_number, |v| v.version_number)
                .map_err(|_| StoreError::NotFound {
                    design_id,
                    version_number,
                })?;
            history.versions[idx].custom_name = custom_name;
            Ok(history.versions[idx].clone())
        })
        .await?;

        renamed.ok_or(StoreError::NotFound {
            design_id,
            version_number,
        })
    }

    async fn delete_design(&self, design_id: &DesignId) -> StoreResult<usize> {
        let design_id = *design_id;
        let guard = self.shared.lock(design_id).await;
        let shared = Arc::clone(&self.shared);
        let purge = async move {
            if let Some(journal) = &shared.journal {
                journal.remove(design_id).await?;
            }
            let removed = shared
                .histories
                .remove(&design_id)
                .map(|(_, history)| history.versions.len())
                .unwrap_or(0);
            drop(guard);
            Ok::<_, StoreError>(removed)
        };

        let removed = if self.shared.journal.is_some() {
            tokio::spawn(purge)
                .await
                .map_err(|e| StoreError::Background(e.to_string()))??
        } else {
            purge.await?
        };
        self.shared.release_lock(&design_id);
        Ok(removed)
    }
}

struct MemoryTransaction {
    design_id: DesignId,
    shared: Arc<Shared>,
    staged: Vec<Version>,
    guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl VersionTransaction for MemoryTransaction {
    fn design_id(&self) -> DesignId {
        self.design_id
    }

    async fn max_version_number(&mut self) -> StoreResult<u32> {
        let committed = self
            .shared
            .read(&self.design_id, |h| h.high_water)
            .unwrap_or(0);
        let staged = self
            .staged
            .iter()
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0);
        Ok(committed.max(staged))
    }

    async fn insert(&mut self, version: Version) -> StoreResult<()> {
        if version.design_id != self.design_id {
            return Err(StoreError::WrongDesign {
                expected: self.design_id,
                actual: version.design_id,
            });
        }

        let high_water = self
            .shared
            .read(&self.design_id, |h| h.high_water)
            .unwrap_or(0);
        let staged = self
            .staged
            .iter()
            .any(|v| v.version_number == version.version_number);
        if version.version_number <= high_water || staged {
            return Err(StoreError::UniqueViolation {
                design_id: self.design_id,
                version_number: version.version_number,
            });
        }

        self.staged.push(version);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            design_id,
            shared,
            mut staged,
            guard,
        } = *self;
        if staged.is_empty() {
            return Ok(());
        }
        staged.sort_by_key(|v| v.version_number);

        apply(&shared, guard, design_id, true, move |history| {
            for version in staged {
                history.push(version);
            }
            Ok(())
        })
        .await?;

        debug!(design_id = %design_id, "Committed version transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VersionDraft;
    use labelworks_domain::{Design, DesignContent, UserId};
    use std::time::Duration;

    /// Journal whose writes take `delay`
    struct SlowJournal {
        delay: Duration,
    }

    #[async_trait]
    impl HistoryJournal for SlowJournal {
        async fn write(&self, _history: DesignHistory) -> StoreResult<()> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn remove(&self, _design_id: DesignId) -> StoreResult<()> {
            Ok(())
        }
    }

    fn version(design: &Design, n: u32) -> Version {
        VersionDraft::from_design(design, UserId::from("u1"), format!("h{}", n), None, None)
            .into_version(n)
    }

    fn design() -> Design {
        Design::new(UserId::from("u1"), DesignContent::blank("Crate", 100.0, 50.0)).unwrap()
    }

    async fn commit(store: &InMemoryVersionStore, design: &Design, n: u32) {
        let mut tx = store.begin(design.id).await.unwrap();
        tx.insert(version(design, n)).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_makes_version_visible() {
        let store = InMemoryVersionStore::new();
        let design = design();
        let mut tx = store.begin(design.id).await.unwrap();
        assert_eq!(tx.max_version_number().await.unwrap(), 0);
        tx.insert(version(&design, 1)).await.unwrap();
        assert!(store.latest(&design.id).await.unwrap().is_none());
        tx.commit().await.unwrap();

        let latest = store.latest(&design.id).await.unwrap().unwrap();
        assert_eq!(latest.version_number, 1);
        assert_eq!(store.count(&design.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = InMemoryVersionStore::new();
        let design = design();
        {
            let mut tx = store.begin(design.id).await.unwrap();
            tx.insert(version(&design, 1)).await.unwrap();
        }
        assert_eq!(store.count(&design.id).await.unwrap(), 0);

        // Lock was released by the drop
        let tx = tokio::time::timeout(Duration::from_secs(1), store.begin(design.id)).await;
        assert!(tx.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_number_is_unique_violation() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;

        let mut tx = store.begin(design.id).await.unwrap();
        let err = tx.insert(version(&design, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { version_number: 1, .. }));
    }

    #[tokio::test]
    async fn test_begin_waits_for_open_transaction() {
        let store = InMemoryVersionStore::new();
        let design = design();
        let held = store.begin(design.id).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), store.begin(design.id)).await;
        assert!(blocked.is_err());

        // Other designs are unaffected
        let other = self::design();
        assert!(
            tokio::time::timeout(Duration::from_millis(50), store.begin(other.id))
                .await
                .is_ok()
        );
        drop(held);
    }

    #[tokio::test]
    async fn test_pruned_numbers_are_not_reused() {
        let store = InMemoryVersionStore::new();
        let design = design();
        for n in 1..=3 {
            commit(&store, &design, n).await;
        }
        assert_eq!(store.delete_through(&design.id, 3).await.unwrap(), 3);

        let mut tx = store.begin(design.id).await.unwrap();
        assert_eq!(tx.max_version_number().await.unwrap(), 3);
        assert!(tx.insert(version(&design, 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_and_missing_rename() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;

        let renamed = store
            .rename(&design.id, 1, Some("Launch".to_string()))
            .await
            .unwrap();
        assert_eq!(renamed.custom_name.as_deref(), Some("Launch"));
        assert!(matches!(
            store.rename(&design.id, 2, None).await,
            Err(StoreError::NotFound { version_number: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_design() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;
        commit(&store, &design, 2).await;
        assert_eq!(store.delete_design(&design.id).await.unwrap(), 2);
        assert!(store.list(&design.id).await.unwrap().is_empty());
        assert_eq!(store.delete_design(&design.id).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_journal_write_does_not_block_other_designs() {
        let journal: Arc<dyn HistoryJournal> = Arc::new(SlowJournal {
            delay: Duration::from_millis(300),
        });
        let store = InMemoryVersionStore::with_journal(Vec::new(), Some(journal));
        let slow = design();
        let other = design();

        let writer = {
            let store = store.clone();
            let slow = slow.clone();
            tokio::spawn(async move { commit(&store, &slow, 1).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Reads and locks of any design proceed while the write is in flight
        let quick = Duration::from_millis(100);
        let latest = tokio::time::timeout(quick, store.latest(&slow.id)).await.unwrap();
        assert!(latest.unwrap().is_none(), "unjournaled state must stay hidden");
        assert!(tokio::time::timeout(quick, store.count(&other.id)).await.is_ok());
        assert!(tokio::time::timeout(quick, store.begin(other.id)).await.is_ok());

        writer.await.unwrap();
        assert_eq!(store.count(&slow.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rename_waits_for_open_transaction() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;

        let held = store.begin(design.id).await.unwrap();
        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            store.rename(&design.id, 1, Some("Proof".to_string())),
        )
        .await;
        assert!(blocked.is_err());

        drop(held);
        let renamed = store
            .rename(&design.id, 1, Some("Proof".to_string()))
            .await
            .unwrap();
        assert_eq!(renamed.custom_name.as_deref(), Some("Proof"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delete_design_waits_for_open_transaction() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;

        let mut tx = store.begin(design.id).await.unwrap();
        tx.insert(version(&design, 2)).await.unwrap();

        let purge = {
            let store = store.clone();
            let design_id = design.id;
            tokio::spawn(async move { store.delete_design(&design_id).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!purge.is_finished());

        tx.commit().await.unwrap();
        assert_eq!(purge.await.unwrap().unwrap(), 2);
        assert!(store.list(&design.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_design_drops_lock_entry() {
        let store = InMemoryVersionStore::new();
        let design = design();
        commit(&store, &design, 1).await;
        assert_eq!(store.shared.locks.len(), 1);

        store.delete_design(&design.id).await.unwrap();
        assert!(store.shared.locks.is_empty());
    }
}
