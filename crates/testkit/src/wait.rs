//! Bounded polling and timeouts.
//!
//! All page-object waits go through these primitives: a condition is polled
//! at a fixed interval until it holds or the deadline passes, and a timeout
//! surfaces as a [`TestkitError::Timeout`] naming what was waited for. There
//! is no retry beyond the configured polling.

use crate::result::{TestkitError, TestkitResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Configuration for polling behavior
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total timeout duration
    pub timeout: Duration,
    /// Interval between attempts
    pub poll_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    /// Create a config with the given timeout and default polling
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Budget for detecting authenticated navigation after login (15s)
    #[must_use]
    pub const fn login_success() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            poll_interval: Duration::from_millis(250),
        }
    }

    /// Budget for a pending network response raced against a click (20s)
    #[must_use]
    pub const fn network_response() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Timeout in milliseconds, for error reporting
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// A synchronous retry assertion polling a closure until success or timeout.
pub struct RetryAssertion<F>
where
    F: FnMut() -> Result<(), String>,
{
    check: F,
    config: RetryConfig,
    description: String,
}

impl<F> RetryAssertion<F>
where
    F: FnMut() -> Result<(), String>,
{
    /// Create a retry assertion over a check closure.
    ///
    /// The closure returns `Ok(())` when the condition holds and
    /// `Err(message)` describing the latest failure otherwise.
    pub fn new(description: impl Into<String>, check: F) -> Self {
        Self {
            check,
            config: RetryConfig::default(),
            description: description.into(),
        }
    }

    /// Set the full config
    #[must_use]
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Poll until the check passes or the deadline expires.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` carrying the last failure message.
    pub fn verify(&mut self) -> TestkitResult<()> {
        let start = Instant::now();
        let mut last_error = String::new();

        loop {
            match (self.check)() {
                Ok(()) => return Ok(()),
                Err(message) => last_error = message,
            }

            if start.elapsed() >= self.config.timeout {
                return Err(TestkitError::timeout(
                    self.config.timeout_ms(),
                    format!("{}: {last_error}", self.description),
                ));
            }

            std::thread::sleep(self.config.poll_interval);
        }
    }
}

impl<F> std::fmt::Debug for RetryAssertion<F>
where
    F: FnMut() -> Result<(), String>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryAssertion")
            .field("config", &self.config)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Poll an async predicate until it resolves true or the deadline expires.
///
/// # Errors
///
/// Returns `Timeout` naming `waited_for`, or the predicate's own error.
#[cfg(feature = "browser")]
pub async fn wait_until<F, Fut>(
    config: RetryConfig,
    waited_for: &str,
    mut predicate: F,
) -> TestkitResult<()>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = TestkitResult<bool>>,
{
    let start = Instant::now();
    loop {
        if predicate().await? {
            return Ok(());
        }
        if start.elapsed() >= config.timeout {
            return Err(TestkitError::timeout(config.timeout_ms(), waited_for));
        }
        tokio::time::sleep(config.poll_interval).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_presets() {
        assert_eq!(RetryConfig::login_success().timeout, Duration::from_secs(15));
        assert_eq!(
            RetryConfig::network_response().timeout,
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_verify_passes_immediately() {
        let mut assertion = RetryAssertion::new("always true", || Ok(()));
        assert!(assertion.verify().is_ok());
    }

    #[test]
    fn test_verify_passes_after_retries() {
        let mut remaining = 3;
        let mut assertion = RetryAssertion::new("flaky condition", move || {
            if remaining == 0 {
                Ok(())
            } else {
                remaining -= 1;
                Err("not yet".to_string())
            }
        })
        .with_config(
            RetryConfig::new(Duration::from_secs(1))
                .with_poll_interval(Duration::from_millis(1)),
        );
        assert!(assertion.verify().is_ok());
    }

    #[test]
    fn test_verify_times_out_with_last_message() {
        let mut assertion = RetryAssertion::new("error banner", || {
            Err("no element matched".to_string())
        })
        .with_config(
            RetryConfig::new(Duration::from_millis(20))
                .with_poll_interval(Duration::from_millis(5)),
        );
        let err = assertion.verify().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("error banner"));
        assert!(msg.contains("no element matched"));
        assert!(msg.contains("20ms"));
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_wait_until_times_out() {
        let config = RetryConfig::new(Duration::from_millis(20))
            .with_poll_interval(Duration::from_millis(5));
        let err = wait_until(config, "never true", || async { Ok(false) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("never true"));
    }

    #[cfg(feature = "browser")]
    #[tokio::test]
    async fn test_wait_until_resolves() {
        let config = RetryConfig::new(Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(1));
        let mut calls = 0u32;
        let result = wait_until(config, "third call", || {
            calls += 1;
            let done = calls >= 3;
            async move { Ok(done) }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }
}
