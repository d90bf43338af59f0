//! Audit trail storage and querying

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use labelworks_domain::{AuditEvent, AuditSink, DomainResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ActivityLogError, ActivityLogResult};

/// Default number of trails kept in memory
const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Audit trail entry for a completed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Unique audit entry ID
    pub id: Uuid,
    /// Timestamp of the audited action
    pub timestamp: DateTime<Utc>,
    /// User that triggered the action
    pub actor: String,
    /// Action performed (`create_version`, `restore_version`)
    pub action: String,
    /// Resource affected, as `design:<id>`
    pub resource: String,
    /// Additional audit data
    pub audit_data: HashMap<String, serde_json::Value>,
}

/// Bounded in-memory audit logger
///
/// Oldest trails are dropped once `max_entries` is exceeded.
pub struct AuditLogger {
    trails: RwLock<Vec<AuditTrail>>,
    max_entries: usize,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(max_entries: usize) -> Self {
        Self {
            trails: RwLock::new(Vec::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Log an audit trail entry
    pub async fn log_audit(&self, trail: AuditTrail) -> ActivityLogResult<()> {
        if trail.actor.is_empty() {
            return Err(ActivityLogError::ValidationError {
                message: "Audit trail actor cannot be empty".to_string(),
            });
        }

        let mut trails = self.trails.write().await;
        trails.push(trail);

        // Maintain max entries limit (remove oldest)
        if trails.len() > self.max_entries {
            let excess = trails.len() - self.max_entries;
            trails.drain(0..excess);
        }

        Ok(())
    }

    /// Convert a domain audit event into a trail and log it
    pub async fn audit_from_event(&self, event: &AuditEvent) -> ActivityLogResult<()> {
        let trail = AuditTrail {
            id: event.id,
            timestamp: event.occurred_at,
            actor: event.actor.to_string(),
            action: event.action.as_str().to_string(),
            resource: format!("design:{}", event.design_id),
            audit_data: Self::extract_audit_data(event),
        };

        debug!(
            action = %trail.action,
            resource = %trail.resource,
            "Recording audit trail"
        );
        self.log_audit(trail).await
    }

    /// Get audit trails with optional filtering, newest first
    pub async fn get_audit_trails(
        &self,
        actor: Option<&str>,
        action: Option<&str>,
        resource: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<AuditTrail> {
        let trails = self.trails.read().await;
        let mut filtered: Vec<_> = trails
            .iter()
            .filter(|trail| {
                actor.map_or(true, |a| trail.actor == a)
                    && action.map_or(true, |a| trail.action == a)
                    && resource.map_or(true, |r| trail.resource.contains(r))
            })
            .cloned()
            .collect();

        // Insertion order breaks timestamp ties
        filtered.reverse();
        filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if let Some(limit) = limit {
            filtered.truncate(limit);
        }

        filtered
    }

    /// Number of retained trails
    pub async fn len(&self) -> usize {
        self.trails.read().await.len()
    }

    /// Whether no trail is retained
    pub async fn is_empty(&self) -> bool {
        self.trails.read().await.is_empty()
    }

    fn extract_audit_data(event: &AuditEvent) -> HashMap<String, serde_json::Value> {
        let mut audit_data = HashMap::new();
        audit_data.insert(
            "design_id".to_string(),
            serde_json::json!(event.design_id.to_string()),
        );

        if let serde_json::Value::Object(map) = &event.metadata {
            for (key, value) in map {
                audit_data.insert(key.clone(), value.clone());
            }
        } else if !event.metadata.is_null() {
            audit_data.insert("metadata".to_string(), event.metadata.clone());
        }

        audit_data
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl AuditSink for AuditLogger {
    async fn record(&self, event: AuditEvent) -> DomainResult<()> {
        self.audit_from_event(&event).await.map_err(Into::into)
    }
}
