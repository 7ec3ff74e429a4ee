use crate::backend::BackendError;
use crate::types::Id;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: Id },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Persistence backend unreachable: {0}")]
    Unreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for CoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unreachable(msg) => CoreError::Unreachable(msg),
            BackendError::ConstraintViolation(msg) => CoreError::Conflict(msg),
            BackendError::Internal(msg) => CoreError::Internal(msg),
            BackendError::NotFound { entity, id } => CoreError::NotFound { entity, id },
        }
    }
}
