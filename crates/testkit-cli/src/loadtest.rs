//! Article-creation load scenario.
//!
//! One shared login in the setup phase, then a fixed pool of virtual users
//! each looping until the deadline: create a uniquely-titled article, record
//! the latency and outcome, pace with a one-second sleep. Thresholds are
//! declarative and evaluated once at the end of the run; a slow or failing
//! iteration never aborts the test mid-flight.

use crate::api::{ApiClient, ArticleDraft};
use crate::error::{CliError, CliResult};
use conduit_testkit::TestConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Pause between iterations of one virtual user
pub const ITERATION_PACING: Duration = Duration::from_secs(1);

/// Declarative pass/fail criteria, checked after the run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Maximum allowed p95 latency in milliseconds
    pub p95_max_ms: u64,
    /// Maximum allowed error rate in percent
    pub max_error_rate_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_max_ms: 500,
            max_error_rate_pct: 10.0,
        }
    }
}

/// Outcome of one threshold check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// What was checked, e.g. "p95 < 500ms"
    pub check: String,
    /// Observed value rendered for the report
    pub actual: String,
    /// Whether the check passed
    pub passed: bool,
}

/// Load test configuration
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    /// Concurrent virtual users
    pub vus: u32,
    /// Total run duration
    pub duration: Duration,
    /// API base URL
    pub base_url: String,
    /// Pass/fail criteria
    pub thresholds: Thresholds,
}

impl LoadTestConfig {
    /// Derive the load configuration from the shared test configuration
    #[must_use]
    pub fn from_test_config(config: &TestConfig) -> Self {
        Self {
            vus: config.vus,
            duration: config.load_duration,
            base_url: config.load_base_url.clone(),
            thresholds: Thresholds::default(),
        }
    }
}

/// One recorded iteration
#[derive(Debug, Clone, Copy)]
struct Sample {
    latency_ms: u64,
    ok: bool,
}

/// Aggregated result of a load run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    /// Wall-clock duration in seconds
    pub duration_secs: u64,
    /// Virtual users
    pub vus: u32,
    /// Total iterations
    pub total_requests: u64,
    /// Iterations that created an article and passed the contract checks
    pub successful_requests: u64,
    /// Iterations that failed
    pub failed_requests: u64,
    /// Median latency
    pub p50_ms: u64,
    /// 95th percentile latency
    pub p95_ms: u64,
    /// 99th percentile latency
    pub p99_ms: u64,
    /// Fastest iteration
    pub min_ms: u64,
    /// Slowest iteration
    pub max_ms: u64,
    /// Mean latency
    pub avg_ms: u64,
    /// Requests per second over the whole run
    pub throughput: f64,
    /// Failed iterations as a percentage of the total
    pub error_rate_pct: f64,
    /// Threshold verdicts
    pub thresholds: Vec<ThresholdResult>,
}

impl LoadReport {
    fn from_samples(
        samples: &[Sample],
        vus: u32,
        elapsed: Duration,
        thresholds: Thresholds,
    ) -> Self {
        let mut sorted: Vec<u64> = samples.iter().map(|s| s.latency_ms).collect();
        sorted.sort_unstable();

        let total = samples.len() as u64;
        let failed = samples.iter().filter(|s| !s.ok).count() as u64;
        let sum: u64 = sorted.iter().sum();
        let error_rate_pct = if total == 0 {
            0.0
        } else {
            (failed as f64 / total as f64) * 100.0
        };
        let elapsed_secs = elapsed.as_secs_f64().max(f64::EPSILON);

        let mut report = Self {
            duration_secs: elapsed.as_secs(),
            vus,
            total_requests: total,
            successful_requests: total - failed,
            failed_requests: failed,
            p50_ms: percentile(&sorted, 50),
            p95_ms: percentile(&sorted, 95),
            p99_ms: percentile(&sorted, 99),
            min_ms: sorted.first().copied().unwrap_or(0),
            max_ms: sorted.last().copied().unwrap_or(0),
            avg_ms: if total == 0 { 0 } else { sum / total },
            throughput: total as f64 / elapsed_secs,
            error_rate_pct,
            thresholds: Vec::new(),
        };
        report.thresholds = vec![
            ThresholdResult {
                check: format!("p95 < {}ms", thresholds.p95_max_ms),
                actual: format!("{}ms", report.p95_ms),
                passed: report.p95_ms < thresholds.p95_max_ms,
            },
            ThresholdResult {
                check: format!("error rate < {:.0}%", thresholds.max_error_rate_pct),
                actual: format!("{:.2}%", report.error_rate_pct),
                passed: report.error_rate_pct < thresholds.max_error_rate_pct,
            },
        ];
        report
    }

    /// Whether every threshold held
    #[must_use]
    pub fn passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    /// First breached threshold as an error, if any
    ///
    /// # Errors
    ///
    /// Returns `Threshold` naming the breached check
    pub fn assert_thresholds(&self) -> CliResult<()> {
        match self.thresholds.iter().find(|t| !t.passed) {
            None => Ok(()),
            Some(t) => Err(CliError::threshold(format!(
                "{} (actual: {})",
                t.check, t.actual
            ))),
        }
    }
}

/// Calculate percentile from sorted samples
fn percentile(sorted: &[u64], p: u8) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((f64::from(p) / 100.0) * (sorted.len() - 1) as f64) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Run the article-creation scenario.
///
/// # Errors
///
/// Returns error when the setup login fails; iteration failures only show
/// up in the report.
pub async fn run_load_test(
    config: &LoadTestConfig,
    email: &str,
    password: &str,
    username: &str,
) -> CliResult<LoadReport> {
    let client = ApiClient::new(&config.base_url);

    // Setup phase: one shared token for every worker.
    let token = client.login(email, password, username).await?;
    tracing::info!(
        vus = config.vus,
        duration_secs = config.duration.as_secs(),
        base_url = config.base_url.as_str(),
        "load test starting"
    );

    let samples: Arc<Mutex<Vec<Sample>>> = Arc::new(Mutex::new(Vec::new()));
    let started = Instant::now();
    let deadline = started + config.duration;

    let mut workers = Vec::with_capacity(config.vus as usize);
    for vu in 0..config.vus {
        let client = client.clone();
        let token = token.clone();
        let samples = Arc::clone(&samples);
        workers.push(tokio::spawn(async move {
            while Instant::now() < deadline {
                let draft = ArticleDraft::perf_probe();
                let iteration_start = Instant::now();
                let result = client.create_article(&token, &draft).await;
                let latency_ms = iteration_start.elapsed().as_millis() as u64;

                if let Err(ref e) = result {
                    tracing::debug!(vu, error = %e, "iteration failed");
                }
                samples.lock().await.push(Sample {
                    latency_ms,
                    ok: result.is_ok(),
                });

                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                tokio::time::sleep(ITERATION_PACING.min(deadline - now)).await;
            }
        }));
    }

    for worker in workers {
        // A panicked worker loses its samples but must not sink the run.
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "load worker panicked");
        }
    }

    let samples = samples.lock().await;
    let report = LoadReport::from_samples(
        &samples,
        config.vus,
        started.elapsed(),
        config.thresholds,
    );
    tracing::info!(
        total = report.total_requests,
        failed = report.failed_requests,
        p95_ms = report.p95_ms,
        "load test finished"
    );
    Ok(report)
}

/// Render the report as text
#[must_use]
pub fn render_report(report: &LoadReport) -> String {
    let mut output = String::new();

    output.push_str("LOAD TEST RESULTS: article creation\n");
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    output.push_str(&format!(
        "Duration: {}s │ VUs: {} │ Requests: {} │ Failed: {} ({:.2}%)\n\n",
        report.duration_secs,
        report.vus,
        report.total_requests,
        report.failed_requests,
        report.error_rate_pct
    ));

    output.push_str("Latency:\n");
    output.push_str("┌─────────┬─────────┬─────────┬─────────┬─────────┬─────────┐\n");
    output.push_str("│ p50     │ p95     │ p99     │ min     │ max     │ avg     │\n");
    output.push_str("├─────────┼─────────┼─────────┼─────────┼─────────┼─────────┤\n");
    output.push_str(&format!(
        "│ {:>5}ms │ {:>5}ms │ {:>5}ms │ {:>5}ms │ {:>5}ms │ {:>5}ms │\n",
        report.p50_ms, report.p95_ms, report.p99_ms, report.min_ms, report.max_ms, report.avg_ms
    ));
    output.push_str("└─────────┴─────────┴─────────┴─────────┴─────────┴─────────┘\n\n");

    output.push_str(&format!("Throughput: {:.1} req/s\n\n", report.throughput));

    output.push_str("Thresholds:\n");
    for t in &report.thresholds {
        let symbol = if t.passed { "✓" } else { "✗" };
        output.push_str(&format!("  {} {} (actual: {})\n", symbol, t.check, t.actual));
    }

    output
}

/// Render the report as JSON
#[must_use]
pub fn render_report_json(report: &LoadReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn sample(latency_ms: u64, ok: bool) -> Sample {
        Sample { latency_ms, ok }
    }

    #[test]
    fn test_percentile() {
        let sorted: Vec<u64> = (1..=10).collect();
        assert_eq!(percentile(&sorted, 50), 5);
        assert_eq!(percentile(&sorted, 95), 9);
        assert_eq!(percentile(&sorted, 100), 10);
        assert_eq!(percentile(&[], 50), 0);
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.p95_max_ms, 500);
        assert_eq!(t.max_error_rate_pct, 10.0);
    }

    #[test]
    fn test_report_aggregation() {
        let samples: Vec<Sample> = (1..=100).map(|i| sample(i * 10, i <= 95)).collect();
        let report = LoadReport::from_samples(
            &samples,
            10,
            Duration::from_secs(10),
            Thresholds::default(),
        );
        assert_eq!(report.total_requests, 100);
        assert_eq!(report.failed_requests, 5);
        assert_eq!(report.error_rate_pct, 5.0);
        assert_eq!(report.min_ms, 10);
        assert_eq!(report.max_ms, 1000);
        assert_eq!(report.throughput, 10.0);
    }

    #[test]
    fn test_thresholds_hold_on_fast_clean_run() {
        let samples: Vec<Sample> = (0..50).map(|_| sample(120, true)).collect();
        let report = LoadReport::from_samples(
            &samples,
            5,
            Duration::from_secs(5),
            Thresholds::default(),
        );
        assert!(report.passed());
        report.assert_thresholds().unwrap();
    }

    #[test]
    fn test_p95_breach_fails_at_the_end() {
        let samples: Vec<Sample> = (0..100).map(|_| sample(800, true)).collect();
        let report = LoadReport::from_samples(
            &samples,
            5,
            Duration::from_secs(5),
            Thresholds::default(),
        );
        assert!(!report.passed());
        let err = report.assert_thresholds().unwrap_err();
        assert!(err.to_string().contains("p95 < 500ms"));
        assert!(err.to_string().contains("800ms"));
    }

    #[test]
    fn test_error_rate_breach() {
        // 20% failing, all fast: only the error-rate threshold trips.
        let samples: Vec<Sample> = (0..100).map(|i| sample(50, i % 5 != 0)).collect();
        let report = LoadReport::from_samples(
            &samples,
            5,
            Duration::from_secs(5),
            Thresholds::default(),
        );
        let verdicts: Vec<bool> = report.thresholds.iter().map(|t| t.passed).collect();
        assert_eq!(verdicts, [true, false]);
    }

    #[test]
    fn test_empty_run_reports_zeroes_and_passes() {
        let report =
            LoadReport::from_samples(&[], 5, Duration::from_secs(5), Thresholds::default());
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.error_rate_pct, 0.0);
        assert!(report.passed());
    }

    #[test]
    fn test_render_report_shows_thresholds() {
        let samples: Vec<Sample> = (0..10).map(|_| sample(100, true)).collect();
        let report = LoadReport::from_samples(
            &samples,
            2,
            Duration::from_secs(2),
            Thresholds::default(),
        );
        let text = render_report(&report);
        assert!(text.contains("LOAD TEST RESULTS"));
        assert!(text.contains("✓ p95 < 500ms"));
        assert!(text.contains("✓ error rate < 10%"));

        let json = render_report_json(&report);
        assert!(json.contains("\"p95_ms\": 100"));
    }

    #[test]
    fn test_config_from_test_config() {
        let config = LoadTestConfig::from_test_config(&TestConfig::default());
        assert_eq!(config.vus, 100);
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.base_url, conduit_testkit::DEFAULT_API_URL);
    }
}
