//! Service registration for labelworks-versioning

use std::sync::Arc;

use labelworks_common::di::{ServiceEntry, ServiceFactory};
use tracing::error;

use crate::{config::VersioningConfigLoader, VersionEngine};

inventory::submit! {
    ServiceFactory::with_priority("versioning", create_versioning_services, 20)
}

/// Engine over in-memory collaborators, configured from the environment
///
/// Falls back to defaults when the environment holds an invalid configuration.
fn create_versioning_services() -> Vec<ServiceEntry> {
    let config = VersioningConfigLoader::new().load().unwrap_or_else(|e| {
        error!(error = %e, "Invalid versioning configuration, using defaults");
        Default::default()
    });

    match VersionEngine::builder().config(config).build() {
        Ok(engine) => vec![ServiceEntry::new::<VersionEngine>(Arc::new(engine))],
        Err(e) => {
            error!(error = %e, "Failed to build version engine");
            Vec::new()
        }
    }
}
