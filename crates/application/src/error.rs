//! Application-level errors

use thiserror::Error;

/// Errors returned by application ports and services
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplicationError {
    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Input rejected before or by the backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService(_))
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text shown to the user, without the category prefix
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) | Self::ExternalService(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
