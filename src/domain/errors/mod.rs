// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// Invalid time range
    InvalidTimeRange(String),
    /// Validation failed
    ValidationFailed(String),
    /// Operation not allowed in the current job state
    InvalidState(String),
    /// The remote API answered with a failure; the message is the server's own
    Api(String),
    /// The remote API could not be reached
    Network(String),
    /// Durable mirror read or write failed
    Storage(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Message suitable for showing next to the action that failed.
    ///
    /// API errors are passed through untouched so the server's wording reaches the user.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::Api(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::InvalidTimeRange(msg) => write!(f, "Invalid time range: {}", msg),
            DomainError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            DomainError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            DomainError::Api(msg) => write!(f, "API error: {}", msg),
            DomainError::Network(msg) => write!(f, "Network error: {}", msg),
            DomainError::Storage(msg) => write!(f, "Storage error: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
