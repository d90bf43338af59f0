//! Service registration for labelworks-activity-log

use std::sync::Arc;

use labelworks_common::di::{ServiceEntry, ServiceFactory};

use crate::AuditLogger;

inventory::submit! {
    ServiceFactory::with_priority("activity-log", create_activity_log_services, 10)
}

fn create_activity_log_services() -> Vec<ServiceEntry> {
    vec![ServiceEntry::new::<AuditLogger>(Arc::new(AuditLogger::default()))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelworks_common::di::list_discovered_factories;

    #[test]
    fn test_activity_log_factory_registered() {
        let factories = list_discovered_factories();
        assert!(factories.contains(&"activity-log"), "Factory should be registered");
    }

    #[test]
    fn test_creates_audit_logger() {
        let services = create_activity_log_services();
        assert_eq!(services.len(), 1);
        assert!(services[0].type_name.contains("AuditLogger"));
    }
}
