//! Service registration types for auto-discovery
//!
//! Each labelworks crate submits a [`ServiceFactory`] through `inventory`.
//! The embedding application calls [`collect_all_services`] once at startup
//! and pulls concrete services out of the returned entries with [`resolve`].
//!
//! ```rust,ignore
//! use labelworks_common::di::{ServiceEntry, ServiceFactory};
//! use std::sync::Arc;
//!
//! inventory::submit! {
//!     ServiceFactory::new("audit", create_audit_services)
//! }
//!
//! fn create_audit_services() -> Vec<ServiceEntry> {
//!     vec![ServiceEntry::new::<AuditLogger>(Arc::new(AuditLogger::default()))]
//! }
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, info};

/// A type-erased service instance produced by a factory.
pub struct ServiceEntry {
    /// The TypeId of the service (used as lookup key)
    pub type_id: TypeId,

    /// Human-readable type name for debugging
    pub type_name: &'static str,

    /// The service instance (type-erased)
    pub instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceEntry {
    /// Create a new service entry for a concrete type
    pub fn new<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            instance: instance as Arc<dyn Any + Send + Sync>,
        }
    }

    /// Downcast the instance back to its concrete type
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        if self.type_id != TypeId::of::<T>() {
            return None;
        }
        Arc::clone(&self.instance).downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A service factory that creates the services of one crate.
pub struct ServiceFactory {
    /// Name of the service group (e.g., "audit", "cache", "versioning")
    pub name: &'static str,

    /// Factory function that creates and returns services
    pub factory_fn: fn() -> Vec<ServiceEntry>,

    /// Priority for creation order (lower = earlier, default = 100)
    pub priority: u32,
}

// SAFETY: ServiceFactory only holds a &'static str, a fn pointer and a u32.
unsafe impl Sync for ServiceFactory {}

impl ServiceFactory {
    /// Create a new service factory with default priority
    pub const fn new(name: &'static str, factory_fn: fn() -> Vec<ServiceEntry>) -> Self {
        Self {
            name,
            factory_fn,
            priority: 100,
        }
    }

    /// Create a new service factory with custom priority
    pub const fn with_priority(
        name: &'static str,
        factory_fn: fn() -> Vec<ServiceEntry>,
        priority: u32,
    ) -> Self {
        Self {
            name,
            factory_fn,
            priority,
        }
    }
}

inventory::collect!(ServiceFactory);

/// Collect all services from discovered factories, in priority order.
pub fn collect_all_services() -> Vec<ServiceEntry> {
    let mut factories: Vec<&ServiceFactory> = inventory::iter::<ServiceFactory>().collect();

    // Stable sort keeps submission order for equal priorities
    factories.sort_by_key(|f| f.priority);

    info!(
        factories = factories.len(),
        "Discovered service factories via inventory"
    );

    let mut all_services = Vec::new();
    for factory in factories {
        let services = (factory.factory_fn)();
        debug!(
            factory = factory.name,
            priority = factory.priority,
            services = services.len(),
            "Factory created services"
        );
        all_services.extend(services);
    }

    all_services
}

/// Find the first service of type `T` among collected entries.
pub fn resolve<T: Send + Sync + 'static>(services: &[ServiceEntry]) -> Option<Arc<T>> {
    services.iter().find_map(|entry| entry.downcast::<T>())
}

/// List all discovered service factory names.
pub fn list_discovered_factories() -> Vec<&'static str> {
    inventory::iter::<ServiceFactory>().map(|f| f.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    inventory::submit! {
        ServiceFactory::with_priority("test_common_factory", create_test_services, 1)
    }

    fn create_test_services() -> Vec<ServiceEntry> {
        vec![ServiceEntry::new::<String>(Arc::new(
            "test_service".to_string(),
        ))]
    }

    #[test]
    fn test_discovered_factories_include_test() {
        let names = list_discovered_factories();
        assert!(names.contains(&"test_common_factory"));
    }

    #[test]
    fn test_resolve_collected_service() {
        let services = collect_all_services();
        let resolved = resolve::<String>(&services).expect("String service registered");
        assert_eq!(resolved.as_str(), "test_service");
    }

    #[test]
    fn test_resolve_missing_type() {
        let services = collect_all_services();
        assert!(resolve::<u64>(&services).is_none());
    }

    #[test]
    fn test_service_entry_downcast() {
        let entry = ServiceEntry::new::<i32>(Arc::new(42i32));

        assert_eq!(entry.type_id, TypeId::of::<i32>());
        assert!(entry.type_name.contains("i32"));
        assert_eq!(*entry.downcast::<i32>().unwrap(), 42);
        assert!(entry.downcast::<u8>().is_none());
    }
}
