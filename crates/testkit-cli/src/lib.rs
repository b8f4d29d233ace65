//! conduit-qa: CLI for the Conduit test suite.
//!
//! Three commands: `setup` writes the shared test account to
//! `.auth/test-user.json`, `a11y` runs the axe-core audit against `/login`
//! and `/` (requires the `browser` feature), `load` runs the
//! article-creation load scenario and fails on breached thresholds.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod api;
pub mod commands;
pub mod error;
pub mod loadtest;
pub mod runner;

pub use api::{ApiClient, ArticleDraft};
pub use commands::{Cli, Commands};
pub use error::{CliError, CliResult};
pub use loadtest::{LoadReport, LoadTestConfig, Thresholds};
