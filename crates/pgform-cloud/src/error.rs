//! Cloud layer error types

use crate::reconcile::EntityKind;
use thiserror::Error;

/// Errors raised while planning, applying or persisting cluster state
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Duplicate {kind} name: {name}")]
    DuplicateKey { kind: EntityKind, name: String },

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Action {action} has no usable payload: {reason}")]
    InvalidPayload { action: String, reason: String },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
