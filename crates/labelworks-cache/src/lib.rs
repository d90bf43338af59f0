//! # LabelWorks Cache
//!
//! TTL cache over pluggable storage, and [`DesignReadCache`], the read-through
//! cache that fronts reads of the current design. The versioning engine only
//! sees it through the domain's
//! [`DesignCache`](labelworks_domain::DesignCache) invalidation port.

pub mod cache;
pub mod design_cache;
pub mod di;
pub mod error;
pub mod metrics;
pub mod storage;

pub use cache::{Cache, CacheConfig};
pub use design_cache::DesignReadCache;
pub use error::{CacheError, Result};
pub use metrics::{CacheMetrics, CacheStats};
pub use storage::{CacheEntry, CacheStorage, MemoryStorage};
