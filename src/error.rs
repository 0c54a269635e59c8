// src/error.rs

//! Unified error handling for the collection pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for twinalysis operations.
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

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A cached record could not be decoded
    #[error("Corrupt cache entry {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The timeline API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Credentials are missing or could not be exchanged for a token
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The consumer dropped the receiving end of the output stream
    #[error("Output stream closed by consumer")]
    StreamClosed,

    /// No analysis module is registered under the requested name
    #[error("no such module: {0}")]
    UnknownModule(String),

    /// Collection failed for one user
    #[error("Collection failed for {username}: {source}")]
    Collect {
        username: String,
        #[source]
        source: Box<AppError>,
    },

    /// An internal stage of a job stopped unexpectedly
    #[error("Task error: {0}")]
    Task(String),
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

    /// Create a credentials error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials(message.into())
    }

    /// Create an API error from a response status and body.
    pub fn api(status: u16, message: impl fmt::Display) -> Self {
        Self::Api {
            status,
            message: message.to_string(),
        }
    }

    /// Wrap an error with the user whose collection it aborted.
    pub fn collect(username: impl Into<String>, source: AppError) -> Self {
        Self::Collect {
            username: username.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal task error.
    pub fn task(message: impl fmt::Display) -> Self {
        Self::Task(message.to_string())
    }

    /// Username attached to a per-user collection failure.
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Collect { username, .. } => Some(username),
            _ => None,
        }
    }
}
