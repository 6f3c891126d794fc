use http_baseline::scenario;
use loadmix::{
    Scenario, ThinkTime, UserExecutor, aggregate::RunAggregate, report::BaselineReport,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

async fn target(root_status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(root_status))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("content-type", "application/json"))
        .and(body_json(scenario::echo_payload()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// The baseline mix without pauses, so 100 selections finish quickly.
fn single_user_run(host: String, iterations: usize) -> Scenario<RunAggregate, UserExecutor> {
    Scenario::builder()
        .name("baseline-e2e")
        .think_time(ThinkTime::none())
        .tasks(scenario::tasks().unwrap())
        .hooks(std::sync::Arc::new(scenario::BaselineHooks))
        .executor(
            UserExecutor::builder()
                .host(host)
                .iterations(iterations)
                .seed(2024)
                .build(),
        )
        .build()
}

#[tokio::test]
async fn healthy_target_records_no_failures_and_a_seven_two_one_mix() {
    let server = target(200).await;

    let agg = single_user_run(server.uri(), 100).run().await.unwrap();

    assert_eq!(agg.users, 1);
    assert_eq!(agg.total_requests(), 100);
    assert_eq!(agg.total_failures(), 0);

    let root = agg.requests_for("get_root");
    let health = agg.requests_for("get_health");
    let echo = agg.requests_for("post_echo");
    assert_eq!(root + health + echo, 100);
    assert!((55..=85).contains(&root), "get_root ran {root} times");
    assert!((8..=32).contains(&health), "get_health ran {health} times");
    assert!((2..=20).contains(&echo), "post_echo ran {echo} times");

    // Every echo request matched the JSON body + header mock.
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 100);

    let report = BaselineReport::from(agg);
    assert_eq!(report.error_rate, 0.0);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn root_failures_carry_the_status_code() {
    let server = target(503).await;

    let agg = single_user_run(server.uri(), 60).run().await.unwrap();
    let report = BaselineReport::from(agg.clone());

    let root = agg.requests_for("get_root");
    assert!(root > 0);
    assert_eq!(agg.tasks["get_root"].failures, root);
    assert_eq!(agg.total_failures(), root);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].task, "get_root");
    assert_eq!(report.failures[0].message, "Got status 503");
    assert_eq!(report.failures[0].occurrences, root);
}

#[tokio::test]
async fn unknown_echo_route_is_still_a_default_success() {
    // 404s are not server errors, so health and echo keep counting as successes.
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let agg = single_user_run(server.uri(), 50).run().await.unwrap();

    assert_eq!(agg.total_requests(), 50);
    assert_eq!(agg.total_failures(), 0);
}
