//! Conduit Testkit: browser test automation for the Conduit web app.
//!
//! A Rust-native take on the usual end-to-end stack: page objects over a
//! headless Chromium (Chrome `DevTools` Protocol via chromiumoxide, behind
//! the `browser` feature), route mocking, bounded waits, credential setup,
//! and an axe-core accessibility audit.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │ Test Flow  │    │ Page       │    │ Headless   │
//! │ (Rust)     │───►│ Objects    │───►│ Browser    │
//! │            │    │ + Waits    │    │ (chromium) │
//! └────────────┘    └────────────┘    └────────────┘
//! ```
//!
//! Without the `browser` feature a scriptable mock page stands in for the
//! real browser, keeping the detection and flow logic unit-testable.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod accessibility;
mod browser;
mod config;
mod credentials;
mod locator;
mod network;
mod page_object;
mod result;
mod wait;

pub use accessibility::{Impact, ScanResults, Violation, ViolationNode, WCAG_TAGS};
#[cfg(feature = "browser")]
pub use accessibility::{AxeScanner, AXE_SOURCE_ENV};
pub use browser::{Browser, BrowserConfig, Page};
pub use config::{
    parse_duration, TestConfig, DEFAULT_API_URL, DEFAULT_LOAD_DURATION, DEFAULT_LOGIN_PATH,
    DEFAULT_VUS, DEFAULT_WEB_URL,
};
pub use credentials::{Credentials, AUTH_DIR, CREDENTIALS_FILE};
pub use locator::{DetectionStrategy, Locator, LocatorOptions, Selector, StrategyChain};
pub use network::{
    HttpMethod, MockResponse, MockRouter, ResponseEvent, ResponseLog, ResponseWaiter, Route,
    RouteDecision, UrlPattern,
};
pub use page_object::{LoginPage, PageObject};
pub use result::{TestkitError, TestkitResult};
pub use wait::{RetryAssertion, RetryConfig};
#[cfg(feature = "browser")]
pub use wait::wait_until;

/// Commonly used types, for glob import in test files.
pub mod prelude {
    pub use crate::accessibility::{Impact, ScanResults};
    pub use crate::browser::{Browser, BrowserConfig, Page};
    pub use crate::config::TestConfig;
    pub use crate::credentials::Credentials;
    pub use crate::locator::{Selector, StrategyChain};
    pub use crate::network::{MockResponse, MockRouter, Route, UrlPattern};
    pub use crate::page_object::{LoginPage, PageObject};
    pub use crate::result::{TestkitError, TestkitResult};
    pub use crate::wait::RetryConfig;
}
