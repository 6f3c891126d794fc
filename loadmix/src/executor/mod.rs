//! Executor: the runtime hook that drives a [`Scenario`].
//!
//! The built-in [`UserExecutor`] implements a closed workload model: a fixed number of
//! simulated users, spawned at a steady rate, each running its own sequential loop.
//!
//! # High-level flow
//! 1. A shared execution context is created holding the shutdown channel.
//! 2. A spawner task starts one user every `1 / spawn_rate` seconds.
//! 3. Each user runs `on_start`, then repeatedly:
//!    - pauses for a sampled think time (interrupted by shutdown),
//!    - picks a weighted task and executes it,
//!    - consumes the resulting metric into its user-local `Aggregate`,
//!
//!    until it hits its iteration cap or shutdown is signalled. Then it runs `on_stop`.
//! 4. When the run duration elapses the executor signals shutdown. Spawning stops,
//!    pauses are cut short and in-flight requests finish or hit the request timeout.
//! 5. The executor joins every user, merges their aggregates and calls
//!    [`Aggregate::finish`] with the elapsed time and user count.
//!
//! # Notes
//! - No state is shared between users besides the HTTP client handle; each user owns
//!   its RNG and aggregate.
//! - A panicking user surfaces as [`LoadError::UserTask`].
pub mod users;
pub use users::UserExecutor;

use crate::{aggregate::Aggregate, error::LoadError, metric::RequestMetric, scenario::Scenario};

pub trait Executor<A>
where
    Self: Send + Sync + Sized,
    A: Aggregate<Metric = RequestMetric>,
{
    /// Execute the scenario and return the final aggregate.
    fn exec(
        &self,
        scenario: &Scenario<A, Self>,
    ) -> impl Future<Output = Result<A, LoadError>> + Send;
}
