#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Rejected input; nothing was mutated.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unexpected failure while mutating shared state; nothing was committed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
