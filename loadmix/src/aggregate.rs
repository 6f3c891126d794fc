use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use hdrhistogram::Histogram;

use crate::metric::{Metric, RequestMetric};

/// The `Aggregate` trait defines how raw [`Metric`] values are collected and combined
/// into an intermediate, mergeable representation.
///
/// Aggregates store compact raw data (counts, histograms, failure tallies) and leave
/// derived statistics such as averages or percentiles to a [`Report`](crate::Report).
///
/// Every simulated user owns its own aggregate, so `consume` never contends. At the end
/// of a run the executor merges all user-local aggregates into one and calls
/// [`finish`](Aggregate::finish) on the result.
///
/// # Implementor notes
/// - `merge` must be **associative** and **commutative**; user aggregates are merged
///   in arbitrary order.
pub trait Aggregate
where
    Self: Send + Sync + Debug + Clone,
{
    /// The metric type this aggregate summarizes.
    type Metric: Metric;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple metrics into the current instance.
    fn aggregate(&mut self, metrics: &[Self::Metric]) {
        metrics.iter().for_each(|m| self.consume(m));
    }

    /// Incorporate a single metric into the aggregate.
    fn consume(&mut self, metric: &Self::Metric);

    /// Combine two different aggregates into one.
    fn merge(&mut self, other: Self);

    /// Called once on the merged aggregate after every user has stopped.
    fn finish(&mut self, _elapsed: Duration, _users: usize) {}
}

// Latencies are recorded in microseconds, up to one hour.
const HISTOGRAM_MAX_MICROS: u64 = 3_600_000_000;
const HISTOGRAM_SIGFIG: u8 = 3;

fn latency_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(1, HISTOGRAM_MAX_MICROS, HISTOGRAM_SIGFIG)
        .expect("static histogram bounds are valid")
}

/// Raw statistics for one task.
#[derive(Debug, Clone)]
pub struct TaskStats {
    pub method: String,
    pub path: String,
    pub requests: u64,
    pub failures: u64,
    pub bytes: u64,
    /// Failure message -> occurrences.
    pub errors: BTreeMap<String, u64>,
    pub latency: Histogram<u64>,
}

impl TaskStats {
    pub(crate) fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_owned(),
            path: path.to_owned(),
            requests: 0,
            failures: 0,
            bytes: 0,
            errors: BTreeMap::new(),
            latency: latency_histogram(),
        }
    }

    fn record(&mut self, metric: &RequestMetric) {
        self.requests += 1;
        self.bytes += metric.bytes as u64;
        let micros = u64::try_from(metric.latency.as_micros()).unwrap_or(u64::MAX);
        self.latency.saturating_record(micros.max(1));
        if let Some(message) = metric.outcome.message() {
            self.failures += 1;
            *self.errors.entry(message.to_owned()).or_default() += 1;
        }
    }

    pub(crate) fn absorb(&mut self, other: TaskStats) {
        self.requests += other.requests;
        self.failures += other.failures;
        self.bytes += other.bytes;
        for (message, count) in other.errors {
            *self.errors.entry(message).or_default() += count;
        }
        if let Err(err) = self.latency.add(&other.latency) {
            tracing::warn!(%err, path = %self.path, "dropping latency samples on merge");
        }
    }
}

/// Run-wide aggregate: per-task statistics plus the run shape.
#[derive(Debug, Clone, Default)]
pub struct RunAggregate {
    pub tasks: BTreeMap<String, TaskStats>,
    pub users: usize,
    pub elapsed: Duration,
}

impl RunAggregate {
    pub fn total_requests(&self) -> u64 {
        self.tasks.values().map(|t| t.requests).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.tasks.values().map(|t| t.failures).sum()
    }

    /// Requests recorded for one task, zero if it never ran.
    pub fn requests_for(&self, task: &str) -> u64 {
        self.tasks.get(task).map_or(0, |t| t.requests)
    }
}

impl Aggregate for RunAggregate {
    type Metric = RequestMetric;

    fn new() -> Self {
        RunAggregate::default()
    }

    fn consume(&mut self, metric: &Self::Metric) {
        if let Some(stats) = self.tasks.get_mut(&metric.task) {
            stats.record(metric);
            return;
        }
        let mut stats = TaskStats::new(&metric.method, &metric.path);
        stats.record(metric);
        self.tasks.insert(metric.task.clone(), stats);
    }

    fn merge(&mut self, other: Self) {
        for (task, stats) in other.tasks {
            match self.tasks.get_mut(&task) {
                Some(existing) => existing.absorb(stats),
                None => {
                    self.tasks.insert(task, stats);
                }
            }
        }
        self.users += other.users;
        self.elapsed = self.elapsed.max(other.elapsed);
    }

    fn finish(&mut self, elapsed: Duration, users: usize) {
        self.elapsed = elapsed;
        self.users = users;
    }
}
