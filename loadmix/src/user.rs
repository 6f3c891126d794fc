use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use reqwest::Client;
use tokio::time::Instant;

use crate::{
    error::LoadError,
    metric::{Outcome, RequestMetric},
    response::ScopedResponse,
    task::TaskDefinition,
};

/// Per-user setup and teardown.
///
/// Both hooks default to no-ops. A failing `on_start` keeps that user from running
/// any task; a failing `on_stop` is only logged.
#[async_trait]
pub trait UserHooks: Send + Sync {
    async fn on_start(&self, _user: &mut SimulatedUser) -> Result<(), LoadError> {
        Ok(())
    }

    async fn on_stop(&self, _user: &mut SimulatedUser) -> Result<(), LoadError> {
        Ok(())
    }
}

/// Hooks that do nothing.
pub struct NoopHooks;

impl UserHooks for NoopHooks {}

/// One simulated user: an HTTP client bound to the target host plus its own RNG.
pub struct SimulatedUser {
    id: usize,
    client: Client,
    host: String,
    rng: StdRng,
}

impl SimulatedUser {
    /// `seed` makes the user's think times and task choices reproducible.
    pub fn new(id: usize, client: Client, host: &str, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            id,
            client,
            host: host.trim_end_matches('/').to_owned(),
            rng,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Issue the task's request and classify the response.
    ///
    /// Transport errors become failures, never `Err`: a user keeps going after them.
    pub async fn execute(&self, task: &TaskDefinition) -> RequestMetric {
        let mut request = self
            .client
            .request(task.method().clone(), self.url(task.path()));
        if let Some(body) = task.body() {
            request = request.json(body);
        }
        request = request.headers(task.headers().clone());

        let started = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;
        let latency = started.elapsed();

        let (status, bytes, outcome) = match result {
            Ok((status, body)) => {
                let bytes = body.len();
                let mut scoped = ScopedResponse::new(status, body.to_vec());
                task.rule().apply(&mut scoped);
                (Some(status.as_u16()), bytes, scoped.into_outcome())
            }
            Err(err) => (
                err.status().map(|s| s.as_u16()),
                0,
                Outcome::Failure(err.to_string()),
            ),
        };

        tracing::debug!(
            user = self.id,
            task = task.name(),
            status,
            latency_ms = latency.as_secs_f64() * 1000.0,
            success = outcome.is_success(),
            "request finished"
        );

        RequestMetric {
            task: task.name().to_owned(),
            method: task.method().as_str().to_owned(),
            path: task.path().to_owned(),
            latency,
            status,
            bytes,
            outcome,
        }
    }
}
