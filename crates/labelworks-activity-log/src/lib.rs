//! LabelWorks audit trails
//!
//! Keeps an immutable, bounded, queryable record of the actions taken on
//! design history (version creation and restore). [`AuditLogger`] implements
//! the domain's [`AuditSink`](labelworks_domain::AuditSink) port so the
//! versioning engine can record to it directly.
//!
//! ```rust,no_run
//! use labelworks_activity_log::AuditLogger;
//! use labelworks_domain::{AuditEvent, AuditSink, DesignId, UserId};
//!
//! # async fn example() {
//! let logger = AuditLogger::new(1_000);
//! logger
//!     .record(AuditEvent::version_created(DesignId::new(), UserId::from("u1"), 1))
//!     .await
//!     .unwrap();
//! assert_eq!(logger.len().await, 1);
//! # }
//! ```

pub mod audit;
pub mod di;
pub mod error;

pub use audit::{AuditLogger, AuditTrail};
pub use error::{ActivityLogError, ActivityLogResult};
