//! Test run configuration.
//!
//! All environment variables are read once, up front, into an explicit
//! [`TestConfig`] that is passed into each component at construction. No
//! component reads the environment on its own.

use crate::result::{TestkitError, TestkitResult};
use std::time::Duration;

/// Default web frontend under test
pub const DEFAULT_WEB_URL: &str = "http://localhost:4100";

/// Default REST API base URL
pub const DEFAULT_API_URL: &str = "https://api.realworld.io/api";

/// Default route serving the login form
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default number of virtual users for the load scenario
pub const DEFAULT_VUS: u32 = 100;

/// Default load scenario duration
pub const DEFAULT_LOAD_DURATION: Duration = Duration::from_secs(30);

/// Configuration for one test run.
///
/// Built from the environment via [`TestConfig::from_env`] or assembled with
/// the `with_*` setters in tests.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Base URL of the web frontend
    pub web_url: String,
    /// Base URL of the REST API
    pub api_url: String,
    /// Route of the login page (relative to `web_url`)
    pub login_path: String,
    /// Test account email
    pub email: String,
    /// Test account password
    pub password: String,
    /// Test account username
    pub username: String,
    /// Virtual users for the load scenario
    pub vus: u32,
    /// Duration of the load scenario
    pub load_duration: Duration,
    /// Base URL the load scenario targets (defaults to `api_url`)
    pub load_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        let email = "testuser@example.com".to_string();
        let username = local_part(&email);
        Self {
            web_url: DEFAULT_WEB_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            email,
            password: "Test123!".to_string(),
            username,
            vus: DEFAULT_VUS,
            load_duration: DEFAULT_LOAD_DURATION,
            load_base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl TestConfig {
    /// Build a configuration from the process environment.
    ///
    /// Recognized variables: `WEB_URL`, `API_URL`, `LOGIN_PATH`,
    /// `TEST_EMAIL`, `TEST_PASSWORD`, `TEST_USERNAME`, `PERF_VUS`,
    /// `PERF_DURATION`, `PERF_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric or duration variable is present
    /// but unparseable. Missing variables fall back to defaults.
    pub fn from_env() -> TestkitResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("WEB_URL") {
            config.web_url = url;
        }
        if let Ok(url) = std::env::var("API_URL") {
            config.api_url = url.clone();
            config.load_base_url = url;
        }
        if let Ok(path) = std::env::var("LOGIN_PATH") {
            config.login_path = path;
        }
        if let Ok(email) = std::env::var("TEST_EMAIL") {
            config.username = local_part(&email);
            config.email = email;
        }
        if let Ok(password) = std::env::var("TEST_PASSWORD") {
            config.password = password;
        }
        if let Ok(username) = std::env::var("TEST_USERNAME") {
            config.username = username;
        }
        if let Ok(vus) = std::env::var("PERF_VUS") {
            config.vus = vus.parse().map_err(|_| TestkitError::ConfigError {
                key: "PERF_VUS".to_string(),
                message: format!("expected a positive integer, got {vus:?}"),
            })?;
        }
        if let Ok(duration) = std::env::var("PERF_DURATION") {
            config.load_duration = parse_duration(&duration).ok_or_else(|| {
                TestkitError::ConfigError {
                    key: "PERF_DURATION".to_string(),
                    message: format!("expected seconds or a value like \"30s\"/\"2m\", got {duration:?}"),
                }
            })?;
        }
        if let Ok(url) = std::env::var("PERF_BASE_URL") {
            config.load_base_url = url;
        }

        Ok(config)
    }

    /// Set the web frontend URL
    #[must_use]
    pub fn with_web_url(mut self, url: impl Into<String>) -> Self {
        self.web_url = url.into();
        self
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the login route
    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Set the test account credentials
    #[must_use]
    pub fn with_account(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let email = email.into();
        self.username = local_part(&email);
        self.email = email;
        self.password = password.into();
        self
    }

    /// Absolute URL of the login page
    #[must_use]
    pub fn login_url(&self) -> String {
        format!(
            "{}{}",
            self.web_url.trim_end_matches('/'),
            self.login_path
        )
    }

    /// Absolute URL of the home feed
    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.web_url.trim_end_matches('/'))
    }
}

/// Local part of an email address (everything before `@`)
fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Parse a duration value: bare seconds, `Ns`, or `Nm`.
#[must_use]
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Some(minutes) = value.strip_suffix('m') {
        return minutes.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
    }
    if let Some(seconds) = value.strip_suffix('s') {
        return seconds.parse::<u64>().ok().map(Duration::from_secs);
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}
