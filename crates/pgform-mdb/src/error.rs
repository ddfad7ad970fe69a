//! Managed PostgreSQL provider error types

use pgform_cloud::{CloudError, EntityKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdbError {
    #[error("Cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: EntityKind, name: String },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: EntityKind, name: String },

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Declaration error: {0}")]
    Spec(#[from] pgform_core::SpecError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, MdbError>;

impl From<MdbError> for CloudError {
    fn from(err: MdbError) -> Self {
        match err {
            MdbError::ClusterNotFound(name) => CloudError::ResourceNotFound(name),
            MdbError::NotFound { kind, name } => {
                CloudError::ResourceNotFound(format!("{kind} {name}"))
            }
            MdbError::AlreadyExists { kind, name } => {
                CloudError::ResourceAlreadyExists(format!("{kind} {name}"))
            }
            MdbError::Spec(e) => CloudError::InvalidConfig(e.to_string()),
            MdbError::JsonError(e) => CloudError::Json(e),
            MdbError::IoError(e) => CloudError::Io(e),
            MdbError::CloudError(e) => e,
            other => CloudError::ApiError(other.to_string()),
        }
    }
}
