//! Error types for Servoid Core

use thiserror::Error;

/// Result type alias for diagnosis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lookup error types
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // Backend errors
    #[error("{url} returned {status}")]
    NotFound { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    // Configuration errors
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Telemetry errors
    #[error("Telemetry delivery failed: {0}")]
    Telemetry(String),
}

impl Error {
    /// Classify a reqwest failure for the given URL
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Error::Timeout { url }
        } else {
            Error::Transport { url, source }
        }
    }

    /// Create a decode error
    pub fn decode(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the error code for telemetry
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Transport { .. } => "TRANSPORT",
            Error::Timeout { .. } => "TIMEOUT",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Decode { .. } => "DECODE",
            Error::EmptyResult(_) => "EMPTY_RESULT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Telemetry(_) => "TELEMETRY",
        }
    }
}
