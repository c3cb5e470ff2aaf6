//! Error handling module for VidClip

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for VidClip operations
#[derive(Error, Debug)]
pub enum ClipperError {
    /// Validation, state or remote failure from the domain layer
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    ConfigError(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigValue { key: String, message: String },

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {message}")]
    LoggingError { message: String },
}

impl ClipperError {
    /// Message to show the user next to the failed action
    pub fn user_message(&self) -> String {
        match self {
            ClipperError::Domain(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for VidClip operations
pub type ClipperResult<T> = std::result::Result<T, ClipperError>;
