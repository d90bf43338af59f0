//! Error types for the activity log crate

use labelworks_domain::DomainError;
use thiserror::Error;

/// Result type for activity logging operations
pub type ActivityLogResult<T> = Result<T, ActivityLogError>;

/// Errors that can occur in activity logging operations
#[derive(Error, Debug)]
pub enum ActivityLogError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<ActivityLogError> for DomainError {
    fn from(err: ActivityLogError) -> Self {
        match err {
            ActivityLogError::ValidationError { message } => {
                DomainError::validation("audit_event", message)
            }
            other => DomainError::StorageFailure {
                reason: other.to_string(),
            },
        }
    }
}
