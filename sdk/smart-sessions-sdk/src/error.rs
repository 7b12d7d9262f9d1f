use smart_sessions_program::SmartSessionError;
use thiserror::Error;

/// SDK-specific error types for building session requests
#[derive(Debug, Error)]
pub enum SessionSdkError {
    /// Session config built without a signer module
    #[error("Session signer not set")]
    MissingSigner,

    /// Execution built without any call
    #[error("Execution has no calls")]
    EmptyExecution,

    /// Error raised by the validator's own encoders
    #[error("Validator error: {0}")]
    Validator(#[from] SmartSessionError),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SessionSdkError>;
