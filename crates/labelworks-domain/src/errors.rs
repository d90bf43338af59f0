//! Domain errors for LabelWorks

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound { entity_type: String, id: String },

    #[error("Concurrency conflict: {resource}")]
    ConcurrencyConflict { resource: String },

    #[error("Storage failure: {reason}")]
    StorageFailure { reason: String },

    #[error("Collaborator unavailable: {service} - {reason}")]
    Unavailable { service: String, reason: String },
}

impl DomainError {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an entity
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::EntityNotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
