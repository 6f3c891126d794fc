//! Baseline traffic profile: typical HTTP traffic for baseline measurement.
//!
//! Users pause 0.5–2s, then pick `GET /` (7), `GET /health` (2) or `POST /echo` (1).

use std::sync::Arc;

use async_trait::async_trait;
use loadmix::{
    Executor, LoadError, Scenario, SimulatedUser, TaskDefinition, TaskSet, ThinkTime,
    UserHooks,
    aggregate::RunAggregate,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
};
use serde_json::{Value, json};

pub const SCENARIO_NAME: &str = "http-baseline";

pub const THINK_MIN_SECS: f64 = 0.5;
pub const THINK_MAX_SECS: f64 = 2.0;

pub const ROOT_WEIGHT: u32 = 7;
pub const HEALTH_WEIGHT: u32 = 2;
pub const ECHO_WEIGHT: u32 = 1;

pub fn think_time() -> Result<ThinkTime, LoadError> {
    ThinkTime::between(THINK_MIN_SECS, THINK_MAX_SECS)
}

/// Most common operation. Anything but 200 is reported as `Got status <code>`.
pub fn get_root() -> TaskDefinition {
    TaskDefinition::get("get_root", "/")
        .weight(ROOT_WEIGHT)
        .expect_status(StatusCode::OK)
}

pub fn get_health() -> TaskDefinition {
    TaskDefinition::get("get_health", "/health").weight(HEALTH_WEIGHT)
}

pub fn echo_payload() -> Value {
    json!({ "message": "baseline test", "timestamp": "now" })
}

pub fn post_echo() -> TaskDefinition {
    TaskDefinition::post("post_echo", "/echo")
        .weight(ECHO_WEIGHT)
        .json(echo_payload())
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
}

pub fn tasks() -> Result<TaskSet, LoadError> {
    TaskSet::new(vec![get_root(), get_health(), post_echo()])
}

/// Per-user setup and teardown. Both are empty for now (e.g. a login would go in
/// `on_start`).
pub struct BaselineHooks;

#[async_trait]
impl UserHooks for BaselineHooks {
    async fn on_start(&self, _user: &mut SimulatedUser) -> Result<(), LoadError> {
        Ok(())
    }

    async fn on_stop(&self, _user: &mut SimulatedUser) -> Result<(), LoadError> {
        Ok(())
    }
}

/// The baseline scenario, driven by `executor`.
pub fn baseline<E>(executor: E) -> Result<Scenario<RunAggregate, E>, LoadError>
where
    E: Executor<RunAggregate>,
{
    Ok(Scenario::builder()
        .name(SCENARIO_NAME)
        .think_time(think_time()?)
        .tasks(tasks()?)
        .hooks(Arc::new(BaselineHooks))
        .executor(executor)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadmix::{
        Outcome, ScopedResponse,
        http::{Client, Method, StatusCode},
    };
    use rand::{SeedableRng, rngs::StdRng};

    fn classify(task: &TaskDefinition, status: StatusCode) -> Outcome {
        let mut response = ScopedResponse::new(status, vec![]);
        task.rule().apply(&mut response);
        response.into_outcome()
    }

    #[test]
    fn weights_follow_seven_two_one() {
        let tasks = tasks().unwrap();
        assert_eq!(tasks.total_weight(), 10);
        assert_eq!(tasks.expected_share("get_root"), Some(0.7));
        assert_eq!(tasks.expected_share("get_health"), Some(0.2));
        assert_eq!(tasks.expected_share("post_echo"), Some(0.1));
    }

    #[test]
    fn requests_target_the_expected_endpoints() {
        let tasks = tasks().unwrap();
        let routes: Vec<(&Method, &str)> = tasks.iter().map(|t| (t.method(), t.path())).collect();
        assert_eq!(
            routes,
            vec![
                (&Method::GET, "/"),
                (&Method::GET, "/health"),
                (&Method::POST, "/echo"),
            ]
        );
    }

    #[test]
    fn root_fails_on_anything_but_200() {
        let root = get_root();
        assert_eq!(classify(&root, StatusCode::OK), Outcome::Success);
        for status in [StatusCode::NO_CONTENT, StatusCode::NOT_FOUND, StatusCode::BAD_GATEWAY] {
            let outcome = classify(&root, status);
            assert!(
                outcome
                    .message()
                    .is_some_and(|m| m.contains(&status.as_u16().to_string())),
                "{status} should fail with its code, got {outcome:?}"
            );
        }
    }

    #[test]
    fn health_and_echo_use_default_classification() {
        for task in [get_health(), post_echo()] {
            assert_eq!(classify(&task, StatusCode::NOT_FOUND), Outcome::Success);
            assert!(!classify(&task, StatusCode::INTERNAL_SERVER_ERROR).is_success());
        }
    }

    #[test]
    fn echo_sends_fixed_json_body() {
        let echo = post_echo();
        let body = serde_json::to_string(echo.body().unwrap()).unwrap();
        let decoded: Value = serde_json::from_str(&body).unwrap();

        assert_eq!(
            decoded,
            json!({ "message": "baseline test", "timestamp": "now" })
        );
        assert_eq!(echo.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn think_time_stays_between_half_and_two_seconds() {
        let think = think_time().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..5_000 {
            let pause = think.sample(&mut rng).as_secs_f64();
            assert!((THINK_MIN_SECS..=THINK_MAX_SECS).contains(&pause), "{pause}");
        }
    }

    #[tokio::test]
    async fn hooks_have_no_side_effects() {
        let server = wiremock::MockServer::start().await;
        let mut user = SimulatedUser::new(0, Client::new(), &server.uri(), Some(3));
        let host = user.host().to_owned();

        BaselineHooks.on_start(&mut user).await.unwrap();
        BaselineHooks.on_stop(&mut user).await.unwrap();

        assert_eq!(user.host(), host);
        assert_eq!(user.id(), 0);
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
