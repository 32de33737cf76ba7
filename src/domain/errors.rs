//! Domain errors for the contentloop engine.

use thiserror::Error;

/// Domain-level errors that can occur in the adaptive engine.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Candidate set is empty: at least one arm key is required")]
    EmptyCandidates,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No signals collected for niche: {0}")]
    MissingSignals(String),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Unknown adaptive capability: {0}")]
    UnknownCapability(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

/// Errors surfaced by publishing.
///
/// `Transient` and `Permanent` come from a [`PublishClient`](crate::domain::ports::PublishClient);
/// the publisher turns them into a failed [`PublishResult`](crate::domain::models::PublishResult).
/// `MissingApprovals` is raised to the caller before any attempt is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("Transient publish failure: {0}")]
    Transient(String),

    #[error("Permanent publish failure: {0}")]
    Permanent(String),

    #[error("Publish blocked by governance gate; missing required approvals: {}", .0.join(", "))]
    MissingApprovals(Vec<String>),
}
