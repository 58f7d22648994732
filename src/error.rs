//! Error types and handling for the ClimaSphere service

use thiserror::Error;

use crate::share::DecodeError;

/// Caller-visible errors.
///
/// Upstream provider failures never appear here: they are absorbed by the
/// fallback fetcher and surfaced only as report metadata.
#[derive(Error, Debug)]
pub enum ClimaError {
    /// Out-of-range coordinates or an unusable date
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Malformed share token
    #[error("Share token error: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ClimaError {
    /// Create a new input validation error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClimaError::InvalidInput { message } => format!("Invalid input: {message}"),
            ClimaError::Decode { .. } => {
                "The shared link is invalid or incomplete.".to_string()
            }
            ClimaError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            ClimaError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
