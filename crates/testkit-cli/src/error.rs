//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// API contract violation
    #[error("API contract violation: {message}")]
    ApiContract {
        /// Error message
        message: String,
    },

    /// Load test threshold breach
    #[error("Threshold breached: {message}")]
    Threshold {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Testkit library error
    #[error("Testkit error: {0}")]
    Testkit(#[from] conduit_testkit::TestkitError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API contract error
    #[must_use]
    pub fn api_contract(message: impl Into<String>) -> Self {
        Self::ApiContract {
            message: message.into(),
        }
    }

    /// Create a threshold breach error
    #[must_use]
    pub fn threshold(message: impl Into<String>) -> Self {
        Self::Threshold {
            message: message.into(),
        }
    }
}
