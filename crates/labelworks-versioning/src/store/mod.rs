//! Snapshot store: persisted version rows keyed by `(design_id, version_number)`

use async_trait::async_trait;
use labelworks_common::JsonStoreError;
use labelworks_domain::DesignId;
use thiserror::Error;

use crate::models::Version;

pub mod file;
pub mod memory;

pub use file::FileVersionStore;
pub use memory::InMemoryVersionStore;

/// Snapshot store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// `(design_id, version_number)` already taken
    #[error("Version {version_number} already exists for design {design_id}")]
    UniqueViolation {
        design_id: DesignId,
        version_number: u32,
    },

    #[error("Version {version_number} not found for design {design_id}")]
    NotFound {
        design_id: DesignId,
        version_number: u32,
    },

    /// Transaction used for a design other than the one it locked
    #[error("Transaction for design {expected} cannot write design {actual}")]
    WrongDesign {
        expected: DesignId,
        actual: DesignId,
    },

    #[error("Storage I/O error: {0}")]
    Io(#[from] JsonStoreError),

    #[error("Corrupt history file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// A detached write task panicked or was cancelled
    #[error("Background write failed: {0}")]
    Background(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage of immutable versions
///
/// Reads never take the per-design transaction lock; only
/// [`VersionStore::begin`] does.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Open a write transaction holding the design's exclusive lock
    ///
    /// Waits while another transaction on the same design is open.
    /// Dropping the transaction without committing discards its writes.
    async fn begin(&self, design_id: DesignId) -> StoreResult<Box<dyn VersionTransaction>>;

    /// Most recently created version
    async fn latest(&self, design_id: &DesignId) -> StoreResult<Option<Version>>;

    async fn get(&self, design_id: &DesignId, version_number: u32) -> StoreResult<Option<Version>>;

    /// All surviving versions in creation order
    async fn list(&self, design_id: &DesignId) -> StoreResult<Vec<Version>>;

    async fn count(&self, design_id: &DesignId) -> StoreResult<usize>;

    /// Surviving version numbers in ascending order
    async fn version_numbers(&self, design_id: &DesignId) -> StoreResult<Vec<u32>>;

    /// Delete every version numbered at or below `cutoff`, in one batch
    async fn delete_through(&self, design_id: &DesignId, cutoff: u32) -> StoreResult<usize>;

    /// Replace a version's custom name
    ///
    /// Like the other writes, waits for the design's open transaction.
    async fn rename(
        &self,
        design_id: &DesignId,
        version_number: u32,
        custom_name: Option<String>,
    ) -> StoreResult<Version>;

    /// Drop a design's whole history once no transaction holds its lock
    async fn delete_design(&self, design_id: &DesignId) -> StoreResult<usize>;
}

/// Write transaction scoped to a single design
#[async_trait]
pub trait VersionTransaction: Send {
    /// Design whose lock this transaction holds
    fn design_id(&self) -> DesignId;

    /// Highest number ever allocated for the design, 0 if none
    async fn max_version_number(&mut self) -> StoreResult<u32>;

    /// Stage a version; fails with [`StoreError::UniqueViolation`] if taken
    async fn insert(&mut self, version: Version) -> StoreResult<()>;

    /// Make staged versions visible and release the lock
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
