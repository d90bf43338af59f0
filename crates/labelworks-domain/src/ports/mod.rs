//! Port interfaces for collaborators of the versioning engine
//!
//! Ports define the contracts for external systems. They are implemented by
//! infrastructure crates (`labelworks-activity-log`, `labelworks-cache`) or
//! by the embedding application.
//!
//! ## Modules
//!
//! - `design`: read/write access to the live design
//! - `cache`: invalidation of the design read cache
//! - `audit`: best-effort audit event recording

pub mod audit;
pub mod cache;
pub mod design;

pub use audit::{AuditAction, AuditEvent, AuditSink, NoopAuditSink};
pub use cache::{DesignCache, NoopDesignCache};
pub use design::DesignRepository;
