//! Accessibility auditing via axe-core.
//!
//! The scan injects the axe-core script into a live page, runs it with the
//! WCAG 2.0/2.1 A and AA rule tags, and parses the violation report. Only
//! critical violations fail an audit; everything else is logged so it still
//! shows up in CI output without blocking a release.

use crate::result::{TestkitError, TestkitResult};
use serde::{Deserialize, Serialize};

/// Rule tags the audit runs with
pub const WCAG_TAGS: [&str; 4] = ["wcag2a", "wcag2aa", "wcag21a", "wcag21aa"];

/// Impact level of a violation, as axe reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Cosmetic or edge-case impact
    Minor,
    /// Noticeable barrier for some users
    Moderate,
    /// Serious barrier for many users
    Serious,
    /// Blocks access entirely
    Critical,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Serious => "serious",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// One element instance a rule flagged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationNode {
    /// CSS selector path to the element
    #[serde(default)]
    pub target: Vec<String>,
    /// Rendered HTML of the element
    #[serde(default)]
    pub html: String,
}

/// A failed axe rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Rule identifier (e.g., "color-contrast")
    pub id: String,
    /// Impact, absent for rules axe cannot grade
    pub impact: Option<Impact>,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Documentation link
    #[serde(default)]
    pub help_url: String,
    /// Flagged elements
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,
}

impl Violation {
    /// Whether the violation is at least `level` severe
    #[must_use]
    pub fn at_least(&self, level: Impact) -> bool {
        self.impact.is_some_and(|i| i >= level)
    }
}

/// Parsed result of one axe scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResults {
    /// URL that was scanned
    #[serde(default)]
    pub url: String,
    /// All reported violations
    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl ScanResults {
    /// Violations at or above an impact level
    #[must_use]
    pub fn violations_at_least(&self, level: Impact) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.at_least(level))
            .collect()
    }

    /// Fail if any critical violation was reported; log the rest.
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` listing the critical rule ids
    pub fn assert_no_critical(&self) -> TestkitResult<()> {
        for violation in &self.violations {
            if !violation.at_least(Impact::Critical) {
                tracing::warn!(
                    rule = violation.id.as_str(),
                    impact = %violation.impact.map_or_else(|| "ungraded".to_string(), |i| i.to_string()),
                    nodes = violation.nodes.len(),
                    url = self.url.as_str(),
                    "accessibility violation (non-blocking)"
                );
            }
        }

        let critical = self.violations_at_least(Impact::Critical);
        if critical.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = critical.iter().map(|v| v.id.as_str()).collect();
        Err(TestkitError::assertion(format!(
            "{} critical accessibility violation(s) on {}: {}",
            critical.len(),
            self.url,
            ids.join(", ")
        )))
    }
}

#[cfg(feature = "browser")]
mod scanner {
    use super::{ScanResults, TestkitError, TestkitResult, WCAG_TAGS};
    use crate::browser::Page;
    use std::path::PathBuf;

    /// Env var pointing at a local axe-core bundle
    pub const AXE_SOURCE_ENV: &str = "AXE_SOURCE_PATH";

    /// Runs axe-core scans against live pages.
    #[derive(Debug, Clone)]
    pub struct AxeScanner {
        source_path: PathBuf,
        tags: Vec<String>,
    }

    impl AxeScanner {
        /// Build a scanner loading axe-core from `AXE_SOURCE_PATH`.
        ///
        /// # Errors
        ///
        /// Returns `ScanError` when the env var is unset
        pub fn from_env() -> TestkitResult<Self> {
            let path = std::env::var(AXE_SOURCE_ENV).map_err(|_| TestkitError::ScanError {
                message: format!("{AXE_SOURCE_ENV} not set; point it at axe.min.js"),
            })?;
            Ok(Self::new(PathBuf::from(path)))
        }

        /// Build a scanner loading axe-core from an explicit path
        #[must_use]
        pub fn new(source_path: PathBuf) -> Self {
            Self {
                source_path,
                tags: WCAG_TAGS.iter().map(ToString::to_string).collect(),
            }
        }

        /// Override the rule tags
        #[must_use]
        pub fn with_tags(mut self, tags: Vec<String>) -> Self {
            self.tags = tags;
            self
        }

        /// Navigate to `url` and run the audit there.
        ///
        /// # Errors
        ///
        /// Returns error on navigation, injection, or parse failure
        pub async fn scan(&self, page: &mut Page, url: &str) -> TestkitResult<ScanResults> {
            page.goto(url).await?;

            let source =
                std::fs::read_to_string(&self.source_path).map_err(|e| TestkitError::ScanError {
                    message: format!("cannot read {}: {e}", self.source_path.display()),
                })?;
            let _: serde_json::Value = page.eval(&format!("{source}; true")).await?;

            let tags = serde_json::to_string(&self.tags)?;
            let script = format!(
                "axe.run(document, {{ runOnly: {{ type: 'tag', values: {tags} }} }})"
            );
            let mut results: ScanResults = page.eval(&script).await?;
            results.url = url.to_string();
            tracing::info!(
                url,
                violations = results.violations.len(),
                "accessibility scan complete"
            );
            Ok(results)
        }
    }
}

#[cfg(feature = "browser")]
pub use scanner::{AxeScanner, AXE_SOURCE_ENV};
