use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RecoveryError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        RecoveryError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for RecoveryError {
    fn from(e: serde_json::Error) -> Self {
        RecoveryError::SerializationError(e.to_string())
    }
}
