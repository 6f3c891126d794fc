//! Loadmix: a small load-testing framework for weighted HTTP traffic mixes.
//!
//! Loadmix follows a closed workload model: a population of simulated users, each
//! running its own loop of *think, pick a weighted task, execute it, record it*. A
//! traffic profile is plain data (a think-time range plus a set of weighted
//! [`TaskDefinition`]s) and the engine does the rest.
//!
//! # Architecture
//!
//! - [`Scenario`]: glue that ties a traffic profile (think time, tasks, hooks) to the
//!   executor that runs it.
//! - [`Executor`]: responsible for actually running the scenario. The built-in
//!   [`UserExecutor`] ramps up users at a spawn rate and stops them after a run
//!   duration or an iteration cap.
//! - [`TaskDefinition`] / [`TaskSet`]: one weighted request and the validated mix.
//! - [`ThinkTime`]: the randomized pause before each task selection.
//! - [`ScopedResponse`] / [`SuccessRule`]: per-response success classification with
//!   explicit overrides.
//! - [`Metric`]: the smallest unit produced by a user; one [`RequestMetric`] per task.
//! - [`Aggregate`]: a mergeable, user-local collector of metrics.
//! - [`Report`]: transforms an `Aggregate` into human- or machine-friendly output.
//! - [`Reporter`]: consumes `Report`s and sends them somewhere (stdout, file).
//!
//! # Example
//!
//! ```no_run
//! use loadmix::{
//!     Reporter, Scenario, TaskDefinition, TaskSet, ThinkTime, UserExecutor,
//!     aggregate::RunAggregate,
//!     report::{BaselineReport, StdoutReporter},
//! };
//!
//! # async fn run() -> Result<(), loadmix::LoadError> {
//! let results = Scenario::<RunAggregate, _>::builder()
//!     .name("Http scenario")
//!     .think_time(ThinkTime::between(0.5, 2.0)?)
//!     .tasks(TaskSet::new(vec![
//!         TaskDefinition::get("root", "/").weight(3),
//!         TaskDefinition::get("health", "/health"),
//!     ])?)
//!     .executor(
//!         UserExecutor::builder()
//!             .host("http://localhost:3000")
//!             .users(10)
//!             .spawn_rate(2.0)
//!             .duration(std::time::Duration::from_secs(30))
//!             .build(),
//!     )
//!     .build()
//!     .run()
//!     .await?;
//!
//! let report = BaselineReport::from(results);
//! StdoutReporter.report(&report).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `internals`: exposes the executor's building blocks (execution context, user
//!   spawner, user loop). Unstable.

/// Metric aggregators
pub mod aggregate;
/// Configuration and runtime errors
pub mod error;
/// Orchestrators that define how things will actually run
pub mod executor;
/// Single metrics
pub mod metric;
/// Reports and Reporters
pub mod report;
/// Response classification
pub mod response;
/// Main module of the framework that glues everything together
pub mod scenario;
/// Weighted request definitions
pub mod task;
/// Pauses between tasks
pub mod think;
/// Simulated users and their lifecycle hooks
pub mod user;

pub use aggregate::Aggregate;
pub use error::LoadError;
pub use executor::{Executor, UserExecutor};
pub use metric::{Metric, Outcome, RequestMetric};
pub use report::{Report, Reporter, Threshold};
pub use response::{ScopedResponse, SuccessRule};
pub use scenario::Scenario;
pub use task::{TaskDefinition, TaskSet};
pub use think::ThinkTime;
pub use user::{NoopHooks, SimulatedUser, UserHooks};

/// HTTP types used in task definitions and hooks.
pub mod http {
    pub use reqwest::{
        Client, Method, StatusCode,
        header::{self, HeaderMap, HeaderName, HeaderValue},
    };
}
