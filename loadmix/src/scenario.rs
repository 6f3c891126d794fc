use std::{marker::PhantomData, sync::Arc};

use typed_builder::TypedBuilder;

use crate::{
    aggregate::Aggregate,
    error::LoadError,
    executor::Executor,
    metric::RequestMetric,
    task::TaskSet,
    think::ThinkTime,
    user::{NoopHooks, UserHooks},
};

/// Glue that ties a traffic profile to the executor that runs it.
///
/// The profile itself is declarative: a think-time range, a weighted [`TaskSet`] and
/// optional per-user lifecycle hooks.
#[derive(TypedBuilder)]
pub struct Scenario<A, E>
where
    A: Aggregate<Metric = RequestMetric>,
    E: Executor<A>,
{
    #[builder(setter(into))]
    pub name: String,
    pub think_time: ThinkTime,
    pub tasks: TaskSet,
    #[builder(default = Arc::new(NoopHooks) as Arc<dyn UserHooks>)]
    pub hooks: Arc<dyn UserHooks>,
    pub executor: E,
    #[builder(default, setter(skip))]
    aggregator: PhantomData<A>,
}

impl<A, E> Scenario<A, E>
where
    A: Aggregate<Metric = RequestMetric>,
    E: Executor<A>,
{
    pub async fn run(&self) -> Result<A, LoadError> {
        self.executor.exec(self).await
    }
}
