use thiserror::Error;

/// Errors raised while configuring or running a load scenario.
///
/// Request failures observed during a run are **not** errors: they are recorded as
/// [`Outcome::Failure`](crate::metric::Outcome::Failure) metrics and the user loop
/// carries on.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("scenario has no tasks")]
    NoTasks,

    #[error("task `{0}` has zero weight")]
    ZeroWeight(String),

    #[error("task `{0}` is defined more than once")]
    DuplicateTask(String),

    #[error("invalid think time: {0}")]
    InvalidThinkTime(String),

    #[error("invalid target host `{host}`: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("invalid run plan: {0}")]
    InvalidPlan(String),

    #[error("user hook failed: {0}")]
    Hook(String),

    #[error("simulated user task failed: {0}")]
    UserTask(#[from] tokio::task::JoinError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
