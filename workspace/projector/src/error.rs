use thiserror::Error;

/// Error types for the projector module
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectorError {
    /// A schedule definition violates a construction-time rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A calendar date could not be constructed.
    #[error("Date error: {0}")]
    Date(String),
}

/// Type alias for Result with ProjectorError
pub type Result<T> = std::result::Result<T, ProjectorError>;
