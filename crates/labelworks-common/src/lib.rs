//! Shared building blocks for the labelworks crates
//!
//! - [`di`]: distributed service registration via `inventory`
//! - [`json_store`]: JSON file persistence with atomic writes
//! - [`logging`]: `tracing` subscriber initialization

pub mod di;
pub mod json_store;
pub mod logging;

pub use di::{collect_all_services, resolve, ServiceEntry, ServiceFactory};
pub use json_store::{JsonStoreError, JsonStoreResult};
pub use logging::{init_logging, LogLevel, LoggingConfig};
