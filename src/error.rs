// src/error.rs

//! Unified error handling for the briefing application.
//!
//! Per-instrument problems never surface here: they are recorded as
//! [`Failure`](crate::models::Failure) values inside the report. `AppError`
//! covers what happens around the collection path (configuration, sinks, I/O).

use std::fmt;

use thiserror::Error;

/// Result type alias for briefing operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Message transport rejected or failed to deliver a message
    #[error("Transport error ({sink}): {message}")]
    Transport { sink: String, message: String },

    /// Static artifact could not be written
    #[error("Storage error for {path}: {message}")]
    Storage { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error for the named sink.
    pub fn transport(sink: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            sink: sink.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error with the offending path.
    pub fn storage(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = AppError::transport("telegram", "HTTP 401");
        assert_eq!(err.to_string(), "Transport error (telegram): HTTP 401");
    }

    #[test]
    fn test_validation_display() {
        let err = AppError::validation("no instruments configured");
        assert_eq!(
            err.to_string(),
            "Validation error: no instruments configured"
        );
    }
}
