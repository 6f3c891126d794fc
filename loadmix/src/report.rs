use std::{fmt::Debug, path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    Aggregate,
    aggregate::{RunAggregate, TaskStats},
    error::LoadError,
};

/// Final, derived view of an [`Aggregate`].
pub trait Report<A>
where
    Self: Send + Sync + Debug + From<A> + Serialize,
    A: Aggregate,
{
}

/// Sends a [`Report`] somewhere: stdout, a file, a database...
#[async_trait]
pub trait Reporter<A: Aggregate, R: Report<A>> {
    async fn report(&self, report: &R) -> Result<(), LoadError>;
}

/// Pass/fail criteria evaluated against the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Threshold {
    /// 95th percentile latency over all requests must stay below this.
    P95Below(Duration),
    /// Failed requests / all requests must stay below this ratio.
    ErrorRateBelow(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold: String,
    pub observed: f64,
    pub passed: bool,
}

/// Statistics for one endpoint, or for all of them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointReport {
    pub name: String,
    pub method: String,
    pub path: String,
    pub requests: u64,
    pub failures: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
    pub rps: f64,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub task: String,
    pub message: String,
    pub occurrences: u64,
}

/// Report of a baseline run: per-endpoint rows, an aggregated row, failures and
/// threshold verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineReport {
    pub elapsed: Duration,
    pub users: usize,
    pub endpoints: Vec<EndpointReport>,
    pub total: EndpointReport,
    pub failures: Vec<FailureReport>,
    pub error_rate: f64,
    pub thresholds: Vec<ThresholdResult>,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

fn endpoint_row(name: &str, stats: &TaskStats, elapsed: Duration) -> EndpointReport {
    let latency = &stats.latency;
    let recorded = !latency.is_empty();
    let micros = |value: u64| if recorded { micros_to_ms(value) } else { 0.0 };
    let secs = elapsed.as_secs_f64();
    EndpointReport {
        name: name.to_owned(),
        method: stats.method.clone(),
        path: stats.path.clone(),
        requests: stats.requests,
        failures: stats.failures,
        avg_ms: if recorded { latency.mean() / 1000.0 } else { 0.0 },
        min_ms: micros(latency.min()),
        p50_ms: micros(latency.value_at_quantile(0.50)),
        p95_ms: micros(latency.value_at_quantile(0.95)),
        p99_ms: micros(latency.value_at_quantile(0.99)),
        max_ms: micros(latency.max()),
        rps: if secs > 0.0 { stats.requests as f64 / secs } else { 0.0 },
        bytes: stats.bytes,
    }
}

impl From<RunAggregate> for BaselineReport {
    fn from(value: RunAggregate) -> Self {
        let endpoints = value
            .tasks
            .iter()
            .map(|(name, stats)| endpoint_row(name, stats, value.elapsed))
            .collect();

        let mut all = TaskStats::new("", "");
        for stats in value.tasks.values() {
            all.absorb(stats.clone());
        }
        let total = endpoint_row("Aggregated", &all, value.elapsed);

        let failures = value
            .tasks
            .iter()
            .flat_map(|(task, stats)| {
                stats.errors.iter().map(move |(message, occurrences)| FailureReport {
                    task: task.clone(),
                    message: message.clone(),
                    occurrences: *occurrences,
                })
            })
            .collect();

        Self {
            elapsed: value.elapsed,
            users: value.users,
            endpoints,
            error_rate: ratio(total.failures, total.requests),
            total,
            failures,
            thresholds: vec![],
        }
    }
}

impl Report<RunAggregate> for BaselineReport {}

impl BaselineReport {
    /// Evaluate `thresholds` and record one result per threshold.
    pub fn with_thresholds(mut self, thresholds: &[Threshold]) -> Self {
        self.thresholds = thresholds
            .iter()
            .map(|threshold| match *threshold {
                Threshold::P95Below(limit) => {
                    let limit_ms = limit.as_secs_f64() * 1000.0;
                    ThresholdResult {
                        threshold: format!("p(95) < {limit_ms}ms"),
                        observed: self.total.p95_ms,
                        passed: self.total.p95_ms < limit_ms,
                    }
                }
                Threshold::ErrorRateBelow(limit) => ThresholdResult {
                    threshold: format!("error rate < {limit}"),
                    observed: self.error_rate,
                    passed: self.error_rate < limit,
                },
            })
            .collect();
        self
    }

    /// `true` when every evaluated threshold passed.
    pub fn passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    /// Human-readable summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("\n=== HTTP Baseline Test Results ===\n\n");
        out.push_str(&format!("Duration: {}ms\n", self.elapsed.as_millis()));
        out.push_str(&format!("Users: {}\n\n", self.users));

        out.push_str("Requests:\n");
        out.push_str(&format!("  Total: {}\n", self.total.requests));
        out.push_str(&format!("  Rate: {:.2}/s\n\n", self.total.rps));

        out.push_str(&format!(
            "{:<14} {:<6} {:<10} {:>8} {:>8} {:>9} {:>9} {:>9} {:>9}\n",
            "Name", "Method", "Path", "Reqs", "Fails", "Avg(ms)", "P50", "P95", "P99"
        ));
        for row in self.endpoints.iter().chain(std::iter::once(&self.total)) {
            out.push_str(&format!(
                "{:<14} {:<6} {:<10} {:>8} {:>8} {:>9.2} {:>9.2} {:>9.2} {:>9.2}\n",
                row.name,
                row.method,
                row.path,
                row.requests,
                row.failures,
                row.avg_ms,
                row.p50_ms,
                row.p95_ms,
                row.p99_ms
            ));
        }

        out.push_str("\nLatency (ms):\n");
        out.push_str(&format!("  Avg: {:.2}\n", self.total.avg_ms));
        out.push_str(&format!("  P50: {:.2}\n", self.total.p50_ms));
        out.push_str(&format!("  P95: {:.2}\n", self.total.p95_ms));
        out.push_str(&format!("  P99: {:.2}\n", self.total.p99_ms));

        out.push_str(&format!("\nErrors: {:.2}%\n", self.error_rate * 100.0));
        for failure in &self.failures {
            out.push_str(&format!(
                "  {} x{}: {}\n",
                failure.task, failure.occurrences, failure.message
            ));
        }

        if !self.thresholds.is_empty() {
            out.push_str(&format!(
                "\nThresholds: {}\n",
                if self.passed() { "PASSED" } else { "FAILED" }
            ));
            for result in &self.thresholds {
                out.push_str(&format!(
                    "  [{}] {} (observed {:.3})\n",
                    if result.passed { "ok" } else { "FAIL" },
                    result.threshold,
                    result.observed
                ));
            }
        }
        out
    }
}

/// Prints the text summary to stdout.
pub struct StdoutReporter;

#[async_trait]
impl Reporter<RunAggregate, BaselineReport> for StdoutReporter {
    async fn report(&self, report: &BaselineReport) -> Result<(), LoadError> {
        println!("{}", report.summary());
        Ok(())
    }
}

/// Writes the report as pretty JSON to `path`.
pub struct JsonFileReporter {
    pub path: PathBuf,
}

#[async_trait]
impl Reporter<RunAggregate, BaselineReport> for JsonFileReporter {
    async fn report(&self, report: &BaselineReport) -> Result<(), LoadError> {
        let value = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&self.path, value).await?;
        tracing::info!(path = %self.path.display(), "summary written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{Outcome, RequestMetric};

    fn sample_aggregate() -> RunAggregate {
        let mut agg = RunAggregate::new();
        for i in 1..=100u64 {
            agg.consume(&RequestMetric {
                task: "get_root".into(),
                method: "GET".into(),
                path: "/".into(),
                latency: Duration::from_millis(i),
                status: Some(200),
                bytes: 2,
                outcome: Outcome::Success,
            });
        }
        for _ in 0..25 {
            agg.consume(&RequestMetric {
                task: "get_health".into(),
                method: "GET".into(),
                path: "/health".into(),
                latency: Duration::from_millis(1),
                status: Some(503),
                bytes: 0,
                outcome: Outcome::Failure("HTTP 503 Service Unavailable".into()),
            });
        }
        agg.finish(Duration::from_secs(5), 4);
        agg
    }

    #[test]
    fn report_derives_rates_and_percentiles() {
        let report = BaselineReport::from(sample_aggregate());

        assert_eq!(report.users, 4);
        assert_eq!(report.total.requests, 125);
        assert_eq!(report.total.failures, 25);
        assert!((report.error_rate - 0.2).abs() < f64::EPSILON);
        assert!((report.total.rps - 25.0).abs() < 1e-9);

        let root = report.endpoints.iter().find(|e| e.name == "get_root").unwrap();
        assert_eq!(root.requests, 100);
        assert_eq!(root.bytes, 200);
        // 3 significant digits keep percentiles within 0.1%.
        assert!((root.p50_ms - 50.0).abs() < 0.1);
        assert!((root.p95_ms - 95.0).abs() < 0.1);
        assert!((root.max_ms - 100.0).abs() < 0.1);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].task, "get_health");
        assert_eq!(report.failures[0].occurrences, 25);
    }

    #[test]
    fn empty_run_reports_zeros() {
        let report = BaselineReport::from(RunAggregate::new());
        assert_eq!(report.total.requests, 0);
        assert_eq!(report.error_rate, 0.0);
        assert_eq!(report.total.p95_ms, 0.0);
        assert_eq!(report.total.rps, 0.0);
        assert!(report.endpoints.is_empty());
    }

    #[test]
    fn thresholds_are_evaluated_against_totals() {
        let report = BaselineReport::from(sample_aggregate()).with_thresholds(&[
            Threshold::P95Below(Duration::from_millis(500)),
            Threshold::ErrorRateBelow(0.1),
        ]);

        assert!(report.thresholds[0].passed);
        assert!(!report.thresholds[1].passed);
        assert!(!report.passed());
        assert!(report.summary().contains("Thresholds: FAILED"));

        let lenient = report.with_thresholds(&[Threshold::ErrorRateBelow(0.5)]);
        assert!(lenient.passed());
    }

    #[tokio::test]
    async fn json_reporter_writes_summary_file() {
        let path = std::env::temp_dir().join(format!("loadmix-report-{}.json", std::process::id()));
        let report = BaselineReport::from(sample_aggregate());

        JsonFileReporter { path: path.clone() }
            .report(&report)
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["users"], 4);
        assert_eq!(written["total"]["requests"], 125);
        assert_eq!(written["failures"][0]["task"], "get_health");
        std::fs::remove_file(path).unwrap();
    }
}
