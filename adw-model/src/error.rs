use thiserror::Error;

/// Convenience alias for model-level fallible operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors surfaced while constructing or validating domain types.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown workflow template: {0}")]
    UnknownTemplate(String),

    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: String, to: String },

    #[error("validation failed: {0}")]
    Validation(String),
}
