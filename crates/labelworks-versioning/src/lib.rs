//! Version history for LabelWorks designs
//!
//! Turns frequently edited designs into an append-only, deduplicated,
//! diffable history:
//!
//! - [`hasher`]: canonical serialization and SHA-256 content hashes
//! - [`numbering`]: gapless per-design version numbers under concurrent saves
//! - [`store`]: snapshot persistence, in memory or as JSON files
//! - [`diff`]: field-level and element-level comparison of two versions
//! - [`restore`]: writing a past version back onto the live design
//! - [`retention`]: background pruning to a bounded number of versions
//!
//! [`VersionEngine`] is the entry point.

pub mod config;
pub mod di;
pub mod diff;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod models;
pub mod numbering;
pub mod repository;
pub mod restore;
pub mod retention;
pub mod store;

// Re-export public API
pub use config::{ConfigError, VersioningConfig, VersioningConfigLoader};
pub use diff::{DesignField, ElementDiff, FieldChange, ModifiedElement, VersionDiff};
pub use engine::{VersionEngine, VersionEngineBuilder};
pub use error::{VersioningError, VersioningResult};
pub use models::{
    RestoreProvenance, RetentionReport, SnapshotOptions, SnapshotOutcome, Version, VersionSummary,
};
pub use numbering::NumberingAuthority;
pub use repository::InMemoryDesignRepository;
pub use restore::RestoreCoordinator;
pub use retention::RetentionManager;
pub use store::{
    FileVersionStore, InMemoryVersionStore, StoreError, VersionStore, VersionTransaction,
};
