//! Error types for mcs-core

use thiserror::Error;

use crate::models::UnknownVariant;

/// Result type alias using mcs-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mcs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Remote API answered successfully but without a body
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// A stored or received enumerated value is not recognised
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),

    /// A local mutation is not allowed in the row's current sync state
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl Error {
    /// Text shown to the user when an operation fails.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) | Self::Conflict(message) => message.clone(),
            Self::NotFound(what) => format!("{what} no longer exists"),
            Self::Api { status, message } => format!("Server error {status}: {message}"),
            Self::EmptyResponse(_) => "The server returned an empty response".to_string(),
            Self::Http(error) if error.is_timeout() => "The server took too long to respond".to_string(),
            Self::Http(_) => "Could not reach the server. Check your connection.".to_string(),
            Self::Database(_) | Self::LibSql(_) | Self::Io(_) => {
                "Local storage failed. Please try again.".to_string()
            }
            Self::Serialization(_) | Self::UnknownVariant(_) => {
                "Received data could not be read".to_string()
            }
        }
    }
}
