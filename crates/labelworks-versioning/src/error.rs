//! Error types for the versioning engine

use labelworks_domain::{DesignId, DomainError};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while snapshotting, restoring or pruning history
#[derive(Debug, Error)]
pub enum VersioningError {
    /// Requested version does not exist (or was pruned)
    #[error("Version {version_number} not found for design {design_id}")]
    VersionNotFound {
        design_id: DesignId,
        version_number: u32,
    },

    /// Version number allocation lost every retry to a concurrent writer
    #[error("Could not allocate a version number for design {design_id} after {attempts} attempts")]
    NumberingConflict { design_id: DesignId, attempts: u32 },

    /// Snapshot store failure
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Store transaction exceeded its time bound
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Canonical serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Design collaborator failure
    #[error("Design error: {0}")]
    Design(#[from] DomainError),
}

impl VersioningError {
    /// Create a new VersionNotFound error
    pub fn version_not_found(design_id: DesignId, version_number: u32) -> Self {
        Self::VersionNotFound {
            design_id,
            version_number,
        }
    }

    /// Create a new Validation error with context
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the caller may simply try the same operation again
    pub fn is_retryable(&self) -> bool {
        match self {
            VersioningError::NumberingConflict { .. }
            | VersioningError::PersistenceFailed(_)
            | VersioningError::Timeout { .. } => true,
            VersioningError::Design(err) => matches!(
                err,
                DomainError::ConcurrencyConflict { .. }
                    | DomainError::StorageFailure { .. }
                    | DomainError::Unavailable { .. }
            ),
            _ => false,
        }
    }

    /// Message suitable for showing to the person who triggered the operation
    pub fn user_message(&self) -> String {
        match self {
            VersioningError::VersionNotFound { version_number, .. } => {
                format!("Version {} not found", version_number)
            }
            VersioningError::Validation(msg) => msg.clone(),
            VersioningError::Design(DomainError::EntityNotFound { .. }) => {
                "Design not found".to_string()
            }
            VersioningError::Design(DomainError::ValidationError { reason, .. }) => reason.clone(),
            err if err.is_retryable() => {
                "Could not save the version right now, please try again".to_string()
            }
            _ => "Something went wrong while updating version history".to_string(),
        }
    }
}

impl From<StoreError> for VersioningError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                design_id,
                version_number,
            } => Self::version_not_found(design_id, version_number),
            other => Self::PersistenceFailed(other.to_string()),
        }
    }
}

/// Result type for versioning operations
pub type VersioningResult<T> = Result<T, VersioningError>;
