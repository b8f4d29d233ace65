//! Command handlers.

use crate::commands::{A11yArgs, LoadArgs, SetupArgs};
use crate::error::{CliError, CliResult};
use crate::loadtest::{render_report, render_report_json, run_load_test, LoadTestConfig};
use conduit_testkit::{Credentials, TestConfig};
use console::style;

/// Write the shared test account to `.auth/test-user.json`.
///
/// # Errors
///
/// Returns error on invalid configuration or a failed write
pub fn run_setup(args: &SetupArgs) -> CliResult<()> {
    let config = TestConfig::from_env()?;
    let credentials = Credentials::from_config(&config);
    let path = credentials.persist(&args.root)?;
    println!(
        "{} credentials written to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

/// Run the accessibility audit against `/login` and `/`.
///
/// # Errors
///
/// Returns error when a scan fails or any critical violation is found
#[cfg(feature = "browser")]
pub fn run_a11y(args: &A11yArgs) -> CliResult<()> {
    use conduit_testkit::{AxeScanner, Browser, BrowserConfig, ScanResults};

    let mut config = TestConfig::from_env()?;
    if let Some(ref url) = args.web_url {
        config = config.with_web_url(url.clone());
    }
    let scanner = match args.axe_source {
        Some(ref path) => AxeScanner::new(path.clone()),
        None => AxeScanner::from_env()?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let results: Vec<ScanResults> = runtime.block_on(async {
        let browser = Browser::launch(BrowserConfig::default().with_no_sandbox()).await?;
        let mut page = browser.new_page().await?;
        let mut results = Vec::new();
        for url in [config.login_url(), config.home_url()] {
            results.push(scanner.scan(&mut page, &url).await?);
        }
        browser.close().await?;
        Ok::<_, CliError>(results)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    let mut failed = false;
    for scan in &results {
        match scan.assert_no_critical() {
            Ok(()) => println!(
                "{} {}: no critical violations ({} total)",
                style("✓").green(),
                scan.url,
                scan.violations.len()
            ),
            Err(e) => {
                failed = true;
                println!("{} {e}", style("✗").red());
            }
        }
    }
    if failed {
        return Err(CliError::config("accessibility audit failed"));
    }
    Ok(())
}

/// Stub when built without browser support.
///
/// # Errors
///
/// Always errors
#[cfg(not(feature = "browser"))]
pub fn run_a11y(_args: &A11yArgs) -> CliResult<()> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

/// Run the load scenario and fail on any breached threshold.
///
/// # Errors
///
/// Returns error on setup failure or a threshold breach
pub fn run_load(args: &LoadArgs) -> CliResult<()> {
    let mut config = TestConfig::from_env()?;
    if let Some(vus) = args.vus {
        config.vus = vus;
    }
    if let Some(ref duration) = args.duration {
        config.load_duration = conduit_testkit::parse_duration(duration).ok_or_else(|| {
            CliError::config(format!("invalid --duration {duration:?} (use e.g. 30s or 2m)"))
        })?;
    }
    if let Some(ref base_url) = args.base_url {
        config.load_base_url = base_url.clone();
    }

    let load_config = LoadTestConfig::from_test_config(&config);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(run_load_test(
        &load_config,
        &config.email,
        &config.password,
        &config.username,
    ))?;

    if args.json {
        println!("{}", render_report_json(&report));
    } else {
        println!("{}", render_report(&report));
    }

    report.assert_thresholds()
}
