use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use loadmix::{Threshold, UserExecutor};

/// HTTP baseline load test: weighted GET /, GET /health and POST /echo traffic
#[derive(Parser, Debug, Clone)]
#[command(name = "http-baseline")]
#[command(version)]
pub struct Cli {
    /// Target base URL
    #[arg(long, env = "TARGET_URL", default_value = "http://demo-app.demo.svc:80")]
    pub host: String,

    /// Number of simulated users
    #[arg(short, long, env = "USERS", default_value_t = 10)]
    pub users: usize,

    /// Users started per second during ramp-up
    #[arg(long, env = "SPAWN_RATE", default_value_t = 1.0)]
    pub spawn_rate: f64,

    /// How long to run, e.g. `60s`, `5m`
    #[arg(short, long, env = "DURATION", default_value = "60s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Stop each user after this many tasks (the run may end earlier on duration)
    #[arg(long, env = "ITERATIONS")]
    pub iterations: Option<usize>,

    /// Seed for reproducible think times and task choices
    #[arg(long, env = "SEED")]
    pub seed: Option<u64>,

    /// Per-request timeout
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// Fail the run when p95 latency is not below this
    #[arg(long, default_value = "500ms", value_parser = humantime::parse_duration)]
    pub p95_threshold: Duration,

    /// Fail the run when the error rate is not below this ratio
    #[arg(long, default_value_t = 0.1)]
    pub max_error_rate: f64,

    /// Also write the report as JSON to this file
    #[arg(long, env = "SUMMARY_PATH")]
    pub summary_path: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    pub fn executor(&self) -> UserExecutor {
        UserExecutor {
            host: self.host.clone(),
            users: self.users,
            spawn_rate: self.spawn_rate,
            duration: Some(self.duration),
            iterations: self.iterations,
            seed: self.seed,
            request_timeout: self.request_timeout,
        }
    }

    pub fn thresholds(&self) -> Vec<Threshold> {
        vec![
            Threshold::P95Below(self.p95_threshold),
            Threshold::ErrorRateBelow(self.max_error_rate),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_onto_the_executor() {
        let cli = Cli::try_parse_from([
            "http-baseline",
            "--host",
            "http://localhost:8080",
            "--users",
            "25",
            "--spawn-rate",
            "5",
            "--duration",
            "2m",
            "--iterations",
            "100",
            "--seed",
            "7",
            "--p95-threshold",
            "250ms",
            "--max-error-rate",
            "0.05",
        ])
        .unwrap();

        let executor = cli.executor();
        assert_eq!(executor.host, "http://localhost:8080");
        assert_eq!(executor.users, 25);
        assert_eq!(executor.spawn_rate, 5.0);
        assert_eq!(executor.duration, Some(Duration::from_secs(120)));
        assert_eq!(executor.iterations, Some(100));
        assert_eq!(executor.seed, Some(7));
        assert!(executor.validate().is_ok());
        assert_eq!(
            cli.thresholds(),
            vec![
                Threshold::P95Below(Duration::from_millis(250)),
                Threshold::ErrorRateBelow(0.05),
            ]
        );
    }

    #[test]
    fn rejects_unparsable_durations() {
        assert!(Cli::try_parse_from(["http-baseline", "--duration", "soon"]).is_err());
    }
}
