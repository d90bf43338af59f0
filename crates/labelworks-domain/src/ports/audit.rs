//! Audit recording port

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::DomainResult,
    value_objects::{DesignId, UserId},
};

/// Audited actions of the versioning engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    CreateVersion,
    RestoreVersion,
}

impl AuditAction {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateVersion => "create_version",
            AuditAction::RestoreVersion => "restore_version",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single auditable occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: AuditAction,
    pub design_id: DesignId,
    pub actor: UserId,
    /// `{"version_number": n}` for creations, `{"restored_from": n}` for restores
    pub metadata: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Event for a newly created version
    pub fn version_created(design_id: DesignId, actor: UserId, version_number: u32) -> Self {
        Self::new(
            AuditAction::CreateVersion,
            design_id,
            actor,
            serde_json::json!({ "version_number": version_number }),
        )
    }

    /// Event for a design restored from a past version
    pub fn version_restored(design_id: DesignId, actor: UserId, restored_from: u32) -> Self {
        Self::new(
            AuditAction::RestoreVersion,
            design_id,
            actor,
            serde_json::json!({ "restored_from": restored_from }),
        )
    }

    fn new(
        action: AuditAction,
        design_id: DesignId,
        actor: UserId,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            design_id,
            actor,
            metadata,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for audit events
///
/// Callers treat recording as best-effort: a failure never fails the audited
/// operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event
    async fn record(&self, event: AuditEvent) -> DomainResult<()>;
}

/// Audit port that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _event: AuditEvent) -> DomainResult<()> {
        Ok(())
    }
}
