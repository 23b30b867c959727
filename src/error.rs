// src/error.rs

//! Unified error handling for the diary client.

use std::fmt;

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be assembled
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

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Form input rejected before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable storage failed
    #[error("Storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    /// The server answered 401 and the local session was discarded
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// The server rejected the request
    #[error("Request failed ({status}): {message}")]
    Server { status: u16, message: String },

    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// A media upload failed
    #[error("Upload failed for {file}: {message}")]
    Upload { file: String, message: String },

    /// The action requires a logged-in user
    #[error("Not logged in")]
    NotLoggedIn,
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

    /// Create a storage error for a key.
    pub fn storage(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a server rejection error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl fmt::Display) -> Self {
        Self::Network(message.to_string())
    }

    /// Create an upload error.
    pub fn upload(file: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Upload {
            file: file.into(),
            message: message.to_string(),
        }
    }

    /// Short text suitable for a transient notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::SessionExpired => "Session expired, please log in again".to_string(),
            Self::Server { message, .. } => message.clone(),
            Self::Network(_) => "Network error, please try again later".to_string(),
            Self::Upload { .. } => "Upload failed".to_string(),
            Self::NotLoggedIn => "Please log in first".to_string(),
            _ => "Operation failed, please try again later".to_string(),
        }
    }

    /// Whether the error means the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotLoggedIn)
    }
}
