//! Service registration for labelworks-cache

use std::{sync::Arc, time::Duration};

use labelworks_common::di::{ServiceEntry, ServiceFactory};

use crate::DesignReadCache;

/// TTL of cached designs when resolved through the registry
const DEFAULT_DESIGN_TTL: Duration = Duration::from_secs(300);

inventory::submit! {
    ServiceFactory::with_priority("cache", create_cache_services, 10)
}

fn create_cache_services() -> Vec<ServiceEntry> {
    vec![ServiceEntry::new::<DesignReadCache>(Arc::new(
        DesignReadCache::new(DEFAULT_DESIGN_TTL),
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelworks_common::di::list_discovered_factories;

    #[test]
    fn test_cache_factory_registered() {
        assert!(list_discovered_factories().contains(&"cache"));
    }

    #[test]
    fn test_creates_design_read_cache() {
        let services = create_cache_services();
        assert_eq!(services.len(), 1);
        assert!(services[0].downcast::<DesignReadCache>().is_some());
    }
}
