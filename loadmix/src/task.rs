//! Task definitions and weighted selection.
//!
//! A [`TaskDefinition`] is pure data: the request a simulated user issues and the
//! rule that classifies its response. A [`TaskSet`] validates a list of definitions
//! and picks one per iteration with probability proportional to its weight.

use std::{collections::HashSet, sync::Arc};

use rand::{
    Rng,
    distributions::{Distribution, WeightedIndex},
};
use reqwest::{
    Method, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;

use crate::{error::LoadError, response::SuccessRule};

/// One weighted request in a scenario's mix.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    name: String,
    weight: u32,
    method: Method,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    rule: SuccessRule,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1,
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            rule: SuccessRule::EngineDefault,
        }
    }

    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::GET, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::POST, path)
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Send `body` serialized as JSON.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Only `status` counts as success; anything else fails with `Got status <code>`.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.rule = SuccessRule::ExpectStatus(status);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight_value(&self) -> u32 {
        self.weight
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn rule(&self) -> &SuccessRule {
        &self.rule
    }
}

/// Validated, ordered set of tasks with a weighted sampler.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: Arc<[TaskDefinition]>,
    index: WeightedIndex<u32>,
    total_weight: u32,
}

impl TaskSet {
    pub fn new(tasks: Vec<TaskDefinition>) -> Result<Self, LoadError> {
        if tasks.is_empty() {
            return Err(LoadError::NoTasks);
        }
        let mut seen = HashSet::new();
        for task in &tasks {
            if task.weight == 0 {
                return Err(LoadError::ZeroWeight(task.name.clone()));
            }
            if !seen.insert(task.name.as_str()) {
                return Err(LoadError::DuplicateTask(task.name.clone()));
            }
        }
        let total_weight = tasks
            .iter()
            .try_fold(0u32, |acc, t| acc.checked_add(t.weight))
            .ok_or_else(|| LoadError::InvalidPlan("sum of task weights overflows".into()))?;
        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight))
            .map_err(|err| LoadError::InvalidPlan(format!("invalid task weights: {err}")))?;

        Ok(Self {
            tasks: tasks.into(),
            index,
            total_weight,
        })
    }

    /// Pick a task with probability `weight / total_weight`.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &TaskDefinition {
        &self.tasks[self.index.sample(rng)]
    }

    pub fn get(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Fraction of selections a task is expected to receive.
    pub fn expected_share(&self, name: &str) -> Option<f64> {
        self.get(name)
            .map(|t| f64::from(t.weight) / f64::from(self.total_weight))
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
