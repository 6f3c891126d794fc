use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use reqwest::{Client, Url};
use tokio::{task::JoinHandle, time::Instant};
use typed_builder::TypedBuilder;

use super::Executor;
use crate::{
    aggregate::Aggregate,
    error::LoadError,
    metric::RequestMetric,
    scenario::Scenario,
    task::TaskSet,
    think::ThinkTime,
    user::{SimulatedUser, UserHooks},
};
use internals::*;

/// Executor that ramps up a fixed population of simulated users and lets each one
/// loop over think / select / execute until the run ends.
///
/// The run ends when `duration` elapses or every user has completed `iterations`
/// tasks, whichever comes first. At least one of the two must be set.
#[derive(Debug, Clone, TypedBuilder)]
pub struct UserExecutor {
    /// Base URL every request path is appended to.
    #[builder(setter(into))]
    pub host: String,
    #[builder(default = 1)]
    pub users: usize,
    /// Users started per second.
    #[builder(default = 1.0)]
    pub spawn_rate: f64,
    #[builder(default, setter(strip_option))]
    pub duration: Option<Duration>,
    /// Per-user cap on executed tasks.
    #[builder(default, setter(strip_option))]
    pub iterations: Option<usize>,
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,
    #[builder(default = Duration::from_secs(60))]
    pub request_timeout: Duration,
}

impl UserExecutor {
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.users == 0 {
            return Err(LoadError::InvalidPlan("at least one user is required".into()));
        }
        if !self.spawn_rate.is_finite() || self.spawn_rate <= 0.0 {
            return Err(LoadError::InvalidPlan(format!(
                "spawn rate must be a positive number, got {}",
                self.spawn_rate
            )));
        }
        match (self.duration, self.iterations) {
            (None, None) => {
                return Err(LoadError::InvalidPlan(
                    "either a run duration or an iteration cap is required".into(),
                ));
            }
            (Some(duration), _) if duration.is_zero() => {
                return Err(LoadError::InvalidPlan("run duration must be non-zero".into()));
            }
            _ => {}
        }
        validate_host(&self.host)
    }
}

/// Accept only absolute http(s) URLs with a host name.
pub fn validate_host(host: &str) -> Result<(), LoadError> {
    let invalid = |reason: String| LoadError::InvalidHost {
        host: host.to_owned(),
        reason,
    };
    let url = Url::parse(host).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host name".into()));
    }
    Ok(())
}

impl<A> Executor<A> for UserExecutor
where
    A: Aggregate<Metric = RequestMetric> + 'static,
{
    async fn exec(&self, scenario: &Scenario<A, Self>) -> Result<A, LoadError> {
        self.validate()?;
        let client = Client::builder().timeout(self.request_timeout).build()?;
        let (ctx, shutdown_tx) = ExecutionContext::new();
        let plan = UserPlan {
            client,
            host: self.host.clone(),
            think_time: scenario.think_time,
            tasks: scenario.tasks.clone(),
            hooks: Arc::clone(&scenario.hooks),
            iterations: self.iterations,
            seed: self.seed,
        };

        tracing::info!(
            scenario = %scenario.name,
            host = %self.host,
            users = self.users,
            spawn_rate = self.spawn_rate,
            "Spawning users..."
        );
        let started = Instant::now();
        let spawner = tokio::spawn(spawn_users::<A>(
            ctx.clone(),
            plan,
            self.users,
            self.spawn_rate,
        ));

        let deadline = async {
            match self.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        let run = async {
            let handles = spawner.await?;
            Ok::<_, LoadError>(join_all(handles).await)
        };
        tokio::pin!(run);

        let results = tokio::select! {
            results = &mut run => results?,
            _ = deadline => {
                tracing::info!("Run duration elapsed, stopping users...");
                shutdown_tx.send_replace(true);
                run.await?
            }
        };

        tracing::info!("Processing results...");
        let mut final_agg = A::new();
        let mut users = 0;
        for result in results {
            final_agg.merge(result?);
            users += 1;
        }
        let elapsed = started.elapsed();
        final_agg.finish(elapsed, users);

        tracing::info!(
            scenario = %scenario.name,
            users,
            ?elapsed,
            "Done running scenario"
        );
        Ok(final_agg)
    }
}

#[cfg(feature = "internals")]
pub use internals::*;

mod internals {
    use tokio::sync::watch::{self, Receiver, Sender};

    use super::*;

    #[derive(Clone)]
    pub struct ExecutionContext {
        pub shutdown: Receiver<bool>,
    }

    impl ExecutionContext {
        pub fn new() -> (Self, Sender<bool>) {
            let (tx, rx) = watch::channel(false);
            (Self { shutdown: rx }, tx)
        }

        pub fn is_shutting_down(&self) -> bool {
            *self.shutdown.borrow()
        }
    }

    /// Everything a user task needs, cloned once per user.
    #[derive(Clone)]
    pub struct UserPlan {
        pub client: Client,
        pub host: String,
        pub think_time: ThinkTime,
        pub tasks: TaskSet,
        pub hooks: Arc<dyn UserHooks>,
        pub iterations: Option<usize>,
        pub seed: Option<u64>,
    }

    /// Start `users` user tasks, one every `1 / spawn_rate` seconds, until all are
    /// running or shutdown is signalled.
    pub async fn spawn_users<A>(
        mut ctx: ExecutionContext,
        plan: UserPlan,
        users: usize,
        spawn_rate: f64,
    ) -> Vec<JoinHandle<A>>
    where
        A: Aggregate<Metric = RequestMetric> + 'static,
    {
        let interval = Duration::try_from_secs_f64(spawn_rate.recip()).unwrap_or(Duration::MAX);
        let mut handles = Vec::with_capacity(users.min(1024));

        for id in 0..users {
            if id > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = ctx.shutdown.wait_for(|stop| *stop) => break,
                }
            }
            if ctx.is_shutting_down() {
                break;
            }
            let user = SimulatedUser::new(id, plan.client.clone(), &plan.host, plan.seed);
            tracing::debug!(user = id, "user spawned");
            handles.push(tokio::spawn(run_user::<A>(ctx.clone(), plan.clone(), user)));
        }

        tracing::info!(spawned = handles.len(), "Running now!");
        handles
    }

    /// One simulated user's lifecycle.
    pub async fn run_user<A>(
        mut ctx: ExecutionContext,
        plan: UserPlan,
        mut user: SimulatedUser,
    ) -> A
    where
        A: Aggregate<Metric = RequestMetric>,
    {
        let mut agg = A::new();
        if let Err(err) = plan.hooks.on_start(&mut user).await {
            tracing::warn!(user = user.id(), %err, "on_start failed, user runs no tasks");
            return agg;
        }

        let mut completed = 0usize;
        loop {
            if plan.iterations.is_some_and(|cap| completed >= cap) || ctx.is_shutting_down() {
                break;
            }
            let pause = plan.think_time.sample(user.rng());
            if !pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = ctx.shutdown.wait_for(|stop| *stop) => break,
                }
            }
            // Shutdown never interrupts a request that is already in flight.
            let task = plan.tasks.choose(user.rng());
            let metric = user.execute(task).await;
            agg.consume(&metric);
            completed += 1;
        }

        if let Err(err) = plan.hooks.on_stop(&mut user).await {
            tracing::warn!(user = user.id(), %err, "on_stop failed");
        }
        tracing::debug!(user = user.id(), completed, "user stopped");
        agg
    }
}
