//! conduit-qa: test automation CLI for the Conduit web app
//!
//! ## Usage
//!
//! ```bash
//! conduit-qa setup                          # Write .auth/test-user.json
//! conduit-qa a11y                           # Audit /login and / (needs --features browser)
//! conduit-qa load --vus 50 --duration 30s   # Article-creation load test
//! ```

use clap::Parser;
use conduit_qa::{runner, Cli, CliResult, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Setup(args) => runner::run_setup(&args),
        Commands::A11y(args) => runner::run_a11y(&args),
        Commands::Load(args) => runner::run_load(&args),
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
