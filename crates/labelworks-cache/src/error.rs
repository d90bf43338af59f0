//! Cache-related error types

use labelworks_domain::DomainError;
use thiserror::Error;

/// Cache operation errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Invalid cache key: {key}")]
    InvalidKey { key: String },

    #[error("Source load failed: {0}")]
    Source(#[from] DomainError),
}

impl From<CacheError> for DomainError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Source(inner) => inner,
            other => DomainError::Unavailable {
                service: "design-cache".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CacheError>;
