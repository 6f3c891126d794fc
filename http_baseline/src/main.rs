use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use http_baseline::{baseline, config::Cli, telemetry};
use loadmix::{
    Reporter,
    report::{BaselineReport, JsonFileReporter, StdoutReporter},
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format, cli.verbose)?;

    tracing::info!(
        host = %cli.host,
        users = cli.users,
        spawn_rate = cli.spawn_rate,
        duration = %humantime::format_duration(cli.duration),
        "HTTP baseline load test starting"
    );

    let scenario = baseline(cli.executor()).context("invalid scenario")?;
    let results = scenario.run().await.context("load run failed")?;

    let report = BaselineReport::from(results).with_thresholds(&cli.thresholds());
    StdoutReporter.report(&report).await?;
    if let Some(path) = &cli.summary_path {
        JsonFileReporter { path: path.clone() }
            .report(&report)
            .await
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }

    if report.passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!("one or more thresholds failed");
        Ok(ExitCode::FAILURE)
    }
}
