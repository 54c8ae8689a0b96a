use crate::types::CameraId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Normalization failed: {0}")]
    Normalization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: CameraId },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
