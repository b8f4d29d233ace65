//! Result and error types for the testkit.

use thiserror::Error;

/// Result type for testkit operations
pub type TestkitResult<T> = Result<T, TestkitError>;

/// Errors that can occur in the testkit
#[derive(Debug, Error)]
pub enum TestkitError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait expired before its condition became true
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Configuration value could not be parsed
    #[error("Invalid configuration for {key}: {message}")]
    ConfigError {
        /// Environment variable or field name
        key: String,
        /// Error message
        message: String,
    },

    /// Stored credentials are missing or malformed
    #[error("Invalid credentials: {message}")]
    CredentialsError {
        /// Error message
        message: String,
    },

    /// Mocked response was constructed with an invalid HTTP status
    #[error("Invalid HTTP status code {status} (must be 100..=599)")]
    InvalidStatus {
        /// The rejected status code
        status: u16,
    },

    /// Accessibility scan failed
    #[error("Accessibility scan failed: {message}")]
    ScanError {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TestkitError {
    /// Create a timeout error
    #[must_use]
    pub fn timeout(ms: u64, waited_for: impl Into<String>) -> Self {
        Self::Timeout {
            ms,
            waited_for: waited_for.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a credentials error
    #[must_use]
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::CredentialsError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = TestkitError::timeout(15_000, "authenticated navigation");
        let msg = err.to_string();
        assert!(msg.contains("15000ms"));
        assert!(msg.contains("authenticated navigation"));
    }

    #[test]
    fn test_assertion_display() {
        let err = TestkitError::assertion("expected error banner");
        assert!(err.to_string().contains("expected error banner"));
    }

    #[test]
    fn test_invalid_status_display() {
        let err = TestkitError::InvalidStatus { status: 999 };
        assert!(err.to_string().contains("999"));
        assert!(err.to_string().contains("100..=599"));
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TestkitError = io.into();
        assert!(err.to_string().contains("I/O"));
    }

    #[test]
    fn test_json_error_from() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TestkitError = parse.into();
        assert!(err.to_string().contains("JSON"));
    }
}
