//! Test credential setup and storage.
//!
//! A one-time preparation step persists the test account to a JSON file so
//! independent test processes can share it. The step is idempotent: the file
//! is overwritten on every run.

use crate::config::TestConfig;
use crate::result::{TestkitError, TestkitResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory (relative to the suite root) holding authentication artifacts
pub const AUTH_DIR: &str = ".auth";

/// File name of the persisted credentials
pub const CREDENTIALS_FILE: &str = "test-user.json";

/// Test account credentials, read-only after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Account username
    pub username: String,
}

impl Credentials {
    /// Derive credentials from the run configuration.
    #[must_use]
    pub fn from_config(config: &TestConfig) -> Self {
        Self {
            email: config.email.clone(),
            password: config.password.clone(),
            username: config.username.clone(),
        }
    }

    /// Check that no field is empty.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError` naming the first empty field.
    pub fn validate(&self) -> TestkitResult<()> {
        for (field, value) in [
            ("email", &self.email),
            ("password", &self.password),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() {
                return Err(TestkitError::credentials(format!(
                    "{field} must be a non-empty string"
                )));
            }
        }
        Ok(())
    }

    /// Write the credentials file under `root/.auth/test-user.json`,
    /// creating the directory if needed and overwriting any previous file.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are invalid or the file cannot
    /// be written.
    pub fn persist(&self, root: &Path) -> TestkitResult<PathBuf> {
        self.validate()?;
        let dir = root.join(AUTH_DIR);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(CREDENTIALS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::info!(
            email = %self.email,
            username = %self.username,
            password = if self.password.is_empty() { "[missing]" } else { "[set]" },
            "prepared test credentials"
        );
        Ok(path)
    }

    /// Load and validate credentials from a file written by [`persist`].
    ///
    /// Fails fast with a descriptive error before any test body runs if the
    /// file is missing, malformed, or contains empty fields.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError` on any of the above.
    ///
    /// [`persist`]: Credentials::persist
    pub fn load(path: &Path) -> TestkitResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TestkitError::credentials(format!(
                "cannot read {}: {e}. Run the setup step first",
                path.display()
            ))
        })?;
        let credentials: Self = serde_json::from_str(&raw).map_err(|e| {
            TestkitError::credentials(format!("malformed {}: {e}", path.display()))
        })?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Default location of the credentials file under `root`.
    #[must_use]
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(AUTH_DIR).join(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> Credentials {
        Credentials {
            email: "qauser@example.com".to_string(),
            password: "Test1234".to_string(),
            username: "qauser".to_string(),
        }
    }

    #[test]
    fn test_from_config() {
        let config = TestConfig::default().with_account("ci@example.com", "pw");
        let credentials = Credentials::from_config(&config);
        assert_eq!(credentials.email, "ci@example.com");
        assert_eq!(credentials.username, "ci");
    }

    #[test]
    fn test_validate_rejects_empty_password() {
        let mut credentials = sample();
        credentials.password = String::new();
        let err = credentials.validate().unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_validate_rejects_whitespace_email() {
        let mut credentials = sample();
        credentials.email = "   ".to_string();
        assert!(credentials.validate().is_err());
    }

    #[test]
    fn test_persist_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample().persist(dir.path()).unwrap();
        assert_eq!(path, Credentials::default_path(dir.path()));

        let loaded = Credentials::load(&path).unwrap();
        assert_eq!(loaded, sample());
        assert!(!loaded.email.is_empty());
        assert!(!loaded.password.is_empty());
    }

    #[test]
    fn test_persist_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        sample().persist(dir.path()).unwrap();

        let mut updated = sample();
        updated.password = "Rotated!".to_string();
        let path = updated.persist(dir.path()).unwrap();

        let loaded = Credentials::load(&path).unwrap();
        assert_eq!(loaded.password, "Rotated!");
    }

    #[test]
    fn test_load_missing_file_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&Credentials::default_path(dir.path())).unwrap_err();
        assert!(err.to_string().contains("setup step"));
    }

    #[test]
    fn test_load_rejects_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(
            &path,
            r#"{"email":"","password":"pw","username":"u"}"#,
        )
        .unwrap();
        let err = Credentials::load(&path).unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Credentials::load(&path).is_err());
    }
}
