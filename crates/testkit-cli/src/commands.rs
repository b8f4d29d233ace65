//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// conduit-qa: test automation for the Conduit web app
#[derive(Parser, Debug)]
#[command(name = "conduit-qa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the shared test account to .auth/test-user.json
    Setup(SetupArgs),

    /// Run the accessibility audit against /login and /
    A11y(A11yArgs),

    /// Run the article-creation load scenario
    Load(LoadArgs),
}

/// Arguments for the setup command
#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Directory the .auth/ folder is created under
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

/// Arguments for the a11y command
#[derive(Parser, Debug)]
pub struct A11yArgs {
    /// Base URL of the web app (overrides WEB_URL)
    #[arg(long)]
    pub web_url: Option<String>,

    /// Path to a local axe-core bundle (overrides AXE_SOURCE_PATH)
    #[arg(long)]
    pub axe_source: Option<PathBuf>,

    /// Emit results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the load command
#[derive(Parser, Debug)]
pub struct LoadArgs {
    /// Concurrent virtual users (overrides PERF_VUS)
    #[arg(long)]
    pub vus: Option<u32>,

    /// Test duration, e.g. "30s" or "2m" (overrides PERF_DURATION)
    #[arg(long)]
    pub duration: Option<String>,

    /// API base URL (overrides PERF_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_flags() {
        let cli = Cli::parse_from([
            "conduit-qa",
            "load",
            "--vus",
            "10",
            "--duration",
            "5s",
            "--json",
        ]);
        match cli.command {
            Commands::Load(args) => {
                assert_eq!(args.vus, Some(10));
                assert_eq!(args.duration.as_deref(), Some("5s"));
                assert!(args.json);
            }
            other => panic!("expected load, got {other:?}"),
        }
    }

    #[test]
    fn test_setup_default_root() {
        let cli = Cli::parse_from(["conduit-qa", "setup"]);
        match cli.command {
            Commands::Setup(args) => assert_eq!(args.root, PathBuf::from(".")),
            other => panic!("expected setup, got {other:?}"),
        }
    }
}
