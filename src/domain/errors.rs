//! Domain errors for the loadout selector.
//!
//! Selection itself never errors; only the persistence and
//! observability paths surface these, and callers report them rather
//! than failing the agent turn.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the persistence and observation paths.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Trace not found: {0}")]
    TraceNotFound(Uuid),

    #[error("Invalid arm id: {0}")]
    InvalidArmId(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Convenience alias used throughout the store and services.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for DomainError {
    fn from(err: chrono::ParseError) -> Self {
        DomainError::Serialization(err.to_string())
    }
}
