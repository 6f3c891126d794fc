use reqwest::StatusCode;

use crate::metric::Outcome;

/// How a task decides whether its response counts as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessRule {
    /// Server errors (5xx) fail, everything else succeeds.
    EngineDefault,
    /// Exactly this status succeeds; any other fails with `Got status <code>`.
    ExpectStatus(StatusCode),
}

impl SuccessRule {
    pub fn apply(&self, response: &mut ScopedResponse) {
        match self {
            SuccessRule::EngineDefault => {}
            SuccessRule::ExpectStatus(expected) => {
                if response.status() == *expected {
                    response.success();
                } else {
                    let code = response.status().as_u16();
                    response.failure(format!("Got status {code}"));
                }
            }
        }
    }
}

/// A received response whose classification can be overridden explicitly.
///
/// When neither [`success`](Self::success) nor [`failure`](Self::failure) is called the
/// default rule applies: status >= 500 fails with `HTTP <status>`.
#[derive(Debug)]
pub struct ScopedResponse {
    status: StatusCode,
    body: Vec<u8>,
    verdict: Option<Outcome>,
}

impl ScopedResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            verdict: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn success(&mut self) {
        self.verdict = Some(Outcome::Success);
    }

    pub fn failure(&mut self, message: impl Into<String>) {
        self.verdict = Some(Outcome::Failure(message.into()));
    }

    pub fn into_outcome(self) -> Outcome {
        self.verdict.unwrap_or_else(|| default_outcome(self.status))
    }
}

/// Classification used when a task does not mark its response explicitly.
pub fn default_outcome(status: StatusCode) -> Outcome {
    if status.is_server_error() {
        Outcome::Failure(format!("HTTP {status}"))
    } else {
        Outcome::Success
    }
}
