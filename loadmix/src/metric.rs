use std::{fmt::Debug, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Metrics that should be collected and processed by the framework.
///
/// A metric is the smallest unit produced by a simulated user: one sample describing
/// one executed task.
pub trait Metric
where
    Self: Serialize + DeserializeOwned + PartialEq + Send + Sync + Debug + Clone,
{
}

/// How a single request was classified.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// The failure label, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(message) => Some(message),
        }
    }
}

/// One executed task as observed by a simulated user.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct RequestMetric {
    /// Name of the task that produced the request.
    pub task: String,
    pub method: String,
    pub path: String,
    /// Time from sending the request until the body was fully read.
    pub latency: Duration,
    /// `None` when the request never got a response (connect error, timeout...).
    pub status: Option<u16>,
    pub bytes: usize,
    pub outcome: Outcome,
}

impl Metric for RequestMetric {}
