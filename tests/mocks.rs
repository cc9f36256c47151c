use reqwest::StatusCode;
use scenario_mock::{
    BodyPrintLimit, Expectation, MockServer, Mode, ResponseTemplate, Scenario, VerificationOutcome,
};
use serde_json::{json, Value};

async fn json_of(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[async_std::test]
async fn new_starts_the_server() {
    // Act
    let mock_server = MockServer::start().await;

    // Assert
    assert!(reqwest::get(&mock_server.uri()).await.is_ok())
}

#[async_std::test]
async fn returns_500_with_unknown_scope_if_no_scenario_is_set() {
    // Arrange
    let mock_server = MockServer::start().await;

    // Act
    let response = reqwest::get(format!("{}/users", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    assert_eq!(body["code"], "unknown_scope");
    assert_eq!(body["scope"], "default");
    assert_eq!(body["knownScopes"], json!([]));
    assert!(body["message"].as_str().unwrap().contains("default"));
    assert_eq!(body["got"]["method"], "GET");
    assert_eq!(body["got"]["path"], "/users");
}

#[async_std::test]
async fn configured_response_is_returned() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Fixture).with(
        Expectation::given("GET", "/users/:id").respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": 1, "name": "Ada" })),
        ),
    );
    mock_server.set_scenario("default", scenario).await;

    // Act
    let response = reqwest::get(format!("{}/users/1", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    assert_eq!(json_of(response).await, json!({ "id": 1, "name": "Ada" }));
}

#[async_std::test]
async fn missing_status_and_body_default_to_200_and_an_empty_object() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario("default", Scenario::new(Mode::Fixture).with(Expectation::any()))
        .await;

    // Act
    let response = reqwest::Client::new()
        .delete(format!("{}/anything/at/all", &mock_server.uri()))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, json!({}));
}

#[async_std::test]
async fn an_invalid_status_code_is_answered_with_500() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Fixture)
        .with(Expectation::any().respond_with(ResponseTemplate::new(1000)));
    mock_server.set_scenario("default", scenario).await;

    // Act
    let response = reqwest::get(&mock_server.uri()).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[async_std::test]
async fn fixture_hits_are_visible_through_the_live_scenario() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Fixture)
        .with(Expectation::given("GET", "/x"))
        .with(Expectation::given("GET", "/y"));
    mock_server.set_scenario("default", scenario).await;

    // Act
    for _ in 0..3 {
        let response = reqwest::get(format!("{}/x", &mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Assert
    let live = mock_server.scenario("default").await.unwrap();
    assert_eq!(live.expectations()[0].hits(), 3);
    assert_eq!(live.expectations()[1].hits(), 0);
    assert_eq!(
        mock_server.verification("default").await.unwrap(),
        VerificationOutcome::Incomplete(vec![Expectation::given("GET", "/y")])
    );
}

#[async_std::test]
async fn stack_mismatch_reports_the_expected_step() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Stack)
        .with(Expectation::given("GET", "/a"))
        .with(Expectation::given("POST", "/b"));
    mock_server.set_scenario("default", scenario).await;

    // Act
    let response = reqwest::Client::new()
        .post(format!("{}/b?dry_run=true", &mock_server.uri()))
        .json(&json!({ "amount": 3 }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    assert_eq!(body["code"], "no_match_next_expected_step");
    assert_eq!(
        body["expected"],
        json!({ "match": { "method": "GET", "path": "/a" }, "response": {}, "hits": 0 })
    );
    assert_eq!(body["got"]["method"], "POST");
    assert_eq!(body["got"]["path"], "/b");
    assert_eq!(body["got"]["query"], json!({ "dry_run": "true" }));
    assert_eq!(body["got"]["body"], json!({ "amount": 3 }));

    // The mismatched step has been consumed.
    let live = mock_server.scenario("default").await.unwrap();
    assert_eq!(live.expectations(), &[Expectation::given("POST", "/b")][..]);
}

#[async_std::test]
async fn pool_failure_reports_the_remaining_steps() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Pool)
        .with(Expectation::path("/a"))
        .with(Expectation::path("/b"));
    mock_server.set_scenario("default", scenario).await;
    let uri = format!("{}/a", &mock_server.uri());

    // Act
    let first = reqwest::get(&uri).await.unwrap();
    let second = reqwest::get(&uri).await.unwrap();

    // Assert
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(second).await;
    assert_eq!(body["code"], "no_match_any_remaining_step");
    assert_eq!(body["remainingSteps"].as_array().unwrap().len(), 1);
    assert_eq!(body["remainingSteps"][0]["match"]["path"], "/b");
}

#[async_std::test]
async fn fixture_failure_reports_all_steps() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Fixture)
        .with(Expectation::given("GET", "/x"))
        .with(Expectation::given("GET", "/y"));
    mock_server.set_scenario("default", scenario).await;

    // Act
    let response = reqwest::get(format!("{}/z", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    assert_eq!(body["code"], "no_match_any_step");
    assert_eq!(body["steps"].as_array().unwrap().len(), 2);
}

#[async_std::test]
async fn an_empty_scenario_answers_every_request_with_500() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario("default", Scenario::new(Mode::Pool))
        .await;

    // Act
    let response = reqwest::get(format!("{}/anything", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_of(response).await["code"], "empty_scenario");
    // An empty scenario is trivially done.
    mock_server.verify("default").await;
}

#[async_std::test]
async fn bodies_above_the_size_limit_are_answered_with_a_generic_500() {
    // Arrange
    let mock_server = MockServer::builder().body_size_limit(16).start().await;
    mock_server
        .set_scenario(
            "default",
            Scenario::new(Mode::Fixture)
                .with(Expectation::given("POST", "/upload").respond_with(ResponseTemplate::new(201))),
        )
        .await;
    let client = reqwest::Client::new();
    let uri = format!("{}/upload", &mock_server.uri());

    // Act
    let small = client.post(&uri).body("tiny").send().await.unwrap();
    let large = client
        .post(&uri)
        .body("a body well above the sixteen byte limit")
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(small.status(), StatusCode::CREATED);
    assert_eq!(large.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_of(large).await, json!({}));
    // The rejected request never reached the scenario.
    let live = mock_server.scenario("default").await.unwrap();
    assert_eq!(live.expectations()[0].hits(), 1);
}

#[async_std::test]
async fn large_bodies_are_not_echoed_back() {
    // Arrange
    let mock_server = MockServer::builder()
        .body_print_limit(BodyPrintLimit::Limited(8))
        .start()
        .await;
    mock_server
        .set_scenario("default", Scenario::new(Mode::Stack).with(Expectation::path("/a")))
        .await;

    // Act
    let response = reqwest::Client::new()
        .post(format!("{}/b", &mock_server.uri()))
        .body("a body longer than eight bytes")
        .send()
        .await
        .unwrap();

    // Assert
    let body = json_of(response).await;
    assert!(body["got"]["body"]
        .as_str()
        .unwrap()
        .starts_with("Too big to log"));
}

#[async_std::test]
async fn scopes_are_isolated_from_each_other() {
    // Arrange
    let mock_server = MockServer::start().await;
    let alpha = Scenario::new(Mode::Pool)
        .with(Expectation::path("/a").respond_with(ResponseTemplate::new(201)));
    let beta = Scenario::new(Mode::Pool)
        .with(Expectation::path("/a").respond_with(ResponseTemplate::new(202)));
    mock_server.set_scenario("alpha", alpha).await;
    mock_server.set_scenario("beta", beta).await;
    let client = reqwest::Client::new();

    // Act
    let by_header = client
        .get(format!("{}/a", &mock_server.uri()))
        .header(mock_server.scope_header(), "alpha")
        .send()
        .await
        .unwrap();
    let by_prefix = client
        .get(format!("{}/a", mock_server.scope_uri("beta")))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(by_header.status(), StatusCode::CREATED);
    assert_eq!(by_prefix.status(), StatusCode::ACCEPTED);
    assert!(mock_server.verification("alpha").await.unwrap().is_complete());
    assert!(mock_server.verification("beta").await.unwrap().is_complete());
    // Nothing was ever set on the default scope.
    assert!(mock_server.scenario("default").await.is_err());
}

#[async_std::test]
async fn scope_header_takes_precedence_over_the_path_prefix() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario(
            "alpha",
            Scenario::new(Mode::Fixture).with(
                Expectation::given("GET", "/a").respond_with(ResponseTemplate::new(201)),
            ),
        )
        .await;
    mock_server
        .set_scenario(
            "beta",
            Scenario::new(Mode::Fixture).with(
                Expectation::given("GET", "/a").respond_with(ResponseTemplate::new(202)),
            ),
        )
        .await;

    // Act
    let response = reqwest::Client::new()
        .get(format!("{}/a", mock_server.scope_uri("beta")))
        .header("x-test-mock-api-scope", "alpha")
        .send()
        .await
        .unwrap();

    // Assert - the prefix is stripped even though the header picked the scope
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[async_std::test]
async fn the_default_scope_header_is_x_test_mock_api_scope() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario(
            "legacy",
            Scenario::new(Mode::Fixture)
                .with(Expectation::any().respond_with(ResponseTemplate::new(202))),
        )
        .await;

    // Act
    let response = reqwest::Client::new()
        .get(format!("{}/anything", &mock_server.uri()))
        .header("X-Test-Mock-Api-Scope", "legacy")
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(mock_server.scope_header(), "x-test-mock-api-scope");
    assert_eq!(mock_server.scope_header(), scenario_mock::SCOPE_HEADER);
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[async_std::test]
async fn a_custom_scope_header_can_be_configured() {
    // Arrange
    let mock_server = MockServer::builder()
        .scope_header("X-Test-Case")
        .start()
        .await;
    mock_server
        .set_scenario("case-1", Scenario::new(Mode::Fixture).with(Expectation::any()))
        .await;

    // Act
    let response = reqwest::Client::new()
        .get(&mock_server.uri())
        .header("x-test-case", "case-1")
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(mock_server.scope_header(), "x-test-case");
    assert_eq!(response.status(), StatusCode::OK);
}

#[async_std::test]
async fn setting_a_scope_replaces_its_scenario() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario("default", Scenario::new(Mode::Pool).with(Expectation::path("/old")))
        .await;

    // Act
    mock_server
        .set_scenario("default", Scenario::new(Mode::Pool).with(Expectation::path("/new")))
        .await;
    let old = reqwest::get(format!("{}/old", &mock_server.uri()))
        .await
        .unwrap();
    let new = reqwest::get(format!("{}/new", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(old.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(new.status(), StatusCode::OK);
}

#[async_std::test]
async fn reset_forgets_every_scope() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario("default", Scenario::new(Mode::Fixture).with(Expectation::any()))
        .await;

    // Act
    mock_server.reset().await;

    // Assert
    let response = reqwest::get(&mock_server.uri()).await.unwrap();
    assert_eq!(json_of(response).await["code"], "unknown_scope");
}

#[async_std::test]
async fn set_and_get_speak_the_wire_format() {
    // Arrange
    let mock_server = MockServer::start().await;
    let client = reqwest::Client::new();
    let scenario = json!({
        "expectations": [
            { "match": { "method": "GET", "path": "/users/:id" }, "response": { "status": 200, "body": { "id": 1 } } },
            { "match": { "path": "/health" } }
        ],
        "mode": { "name": "fixture" }
    });

    // Act
    let set = client
        .post(format!("{}/scenario/set", &mock_server.uri()))
        .json(&json!({ "scope": "wire", "scenario": scenario }))
        .send()
        .await
        .unwrap();
    let hit = client
        .get(format!("{}/users/7", &mock_server.uri()))
        .header("x-test-mock-api-scope", "wire")
        .send()
        .await
        .unwrap();
    let got = client
        .post(format!("{}/scenario/get", &mock_server.uri()))
        .json(&json!({ "scope": "wire" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(set.status(), StatusCode::OK);
    assert_eq!(hit.status(), StatusCode::OK);
    assert_eq!(json_of(hit).await, json!({ "id": 1 }));
    assert_eq!(got.status(), StatusCode::OK);
    assert_eq!(
        json_of(got).await,
        json!({
            "expectations": [
                { "match": { "method": "GET", "path": "/users/:id" }, "response": { "status": 200, "body": { "id": 1 } }, "hits": 1 },
                { "match": { "method": "*", "path": "/health" }, "response": {}, "hits": 0 }
            ],
            "mode": { "name": "fixture" }
        })
    );
}

#[async_std::test]
async fn getting_an_unknown_scope_lists_the_known_ones() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario("zeta", Scenario::new(Mode::Fixture))
        .await;
    mock_server
        .set_scenario("alpha", Scenario::new(Mode::Fixture))
        .await;

    // Act
    let response = reqwest::Client::new()
        .post(format!("{}/scenario/get", &mock_server.uri()))
        .json(&json!({ "scope": "ghost" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_of(response).await;
    assert_eq!(body["code"], "unknown_scope");
    assert_eq!(body["scope"], "ghost");
    assert_eq!(body["knownScopes"], json!(["alpha", "zeta"]));
}

#[async_std::test]
async fn malformed_control_requests_are_rejected_with_400() {
    // Arrange
    let mock_server = MockServer::start().await;
    let client = reqwest::Client::new();

    // Act
    let set = client
        .post(format!("{}/scenario/set", &mock_server.uri()))
        .body("not json")
        .send()
        .await
        .unwrap();
    let get = client
        .post(format!("{}/scenario/get", &mock_server.uri()))
        .json(&json!({ "scenario": {} }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(set.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(set).await["code"], "invalid_control_request");
    assert_eq!(get.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(get).await["code"], "invalid_control_request");
}

#[async_std::test]
async fn a_get_on_the_control_path_is_a_mock_request() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario(
            "default",
            Scenario::new(Mode::Fixture).with(Expectation::given("GET", "/scenario/set")),
        )
        .await;

    // Act
    let response = reqwest::get(format!("{}/scenario/set", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    mock_server.verify("default").await;
}

#[async_std::test]
async fn stack_completes_when_requests_come_in_order() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Stack)
        .with(Expectation::given("GET", "/a"))
        .with(Expectation::given("POST", "/b"));
    mock_server.set_scenario("default", scenario).await;
    let client = reqwest::Client::new();

    // Act
    let a = client
        .get(format!("{}/a", &mock_server.uri()))
        .send()
        .await
        .unwrap();
    let b = client
        .post(format!("{}/b", &mock_server.uri()))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(a.status(), StatusCode::OK);
    assert_eq!(b.status(), StatusCode::OK);
    mock_server.verify("default").await;
}

#[async_std::test]
#[should_panic(expected = "Verification failed for scope `default`")]
async fn verify_panics_when_a_fixture_was_never_hit() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Fixture)
        .with(Expectation::given("GET", "/x"))
        .with(Expectation::given("GET", "/y"));
    mock_server.set_scenario("default", scenario).await;

    // Act
    reqwest::get(format!("{}/x", &mock_server.uri()))
        .await
        .unwrap();

    // Assert
    mock_server.verify("default").await;
}

#[async_std::test]
#[should_panic(expected = "does not exist")]
async fn verify_panics_on_an_unknown_scope() {
    let mock_server = MockServer::start().await;

    mock_server.verify("ghost").await;
}

#[async_std::test]
async fn requests_on_different_scopes_are_served_concurrently() {
    // Arrange
    let mock_server = MockServer::start().await;
    for scope in ["one", "two", "three"] {
        let scenario = Scenario::new(Mode::Pool)
            .with(Expectation::path("/a"))
            .with(Expectation::path("/a"));
        mock_server.set_scenario(scope, scenario).await;
    }

    // Act
    let handles: Vec<_> = ["one", "two", "three", "one", "two", "three"]
        .into_iter()
        .map(|scope| {
            let uri = format!("{}/a", mock_server.scope_uri(scope));
            async_std::task::spawn(async move { reqwest::get(uri).await.unwrap().status() })
        })
        .collect();

    // Assert
    for handle in handles {
        assert_eq!(handle.await, StatusCode::OK);
    }
    for scope in ["one", "two", "three"] {
        assert!(mock_server.verification(scope).await.unwrap().is_complete());
    }
}

#[async_std::test]
async fn dispatching_on_a_scope_leaves_other_scopes_untouched() {
    // Arrange
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Stack)
        .with(Expectation::given("GET", "/a"))
        .with(Expectation::given("GET", "/b"));
    mock_server.set_scenario("alpha", scenario.clone()).await;
    mock_server.set_scenario("beta", scenario.clone()).await;

    // Act - one match and one mismatch on `alpha`
    reqwest::get(format!("{}/a", mock_server.scope_uri("alpha")))
        .await
        .unwrap();
    reqwest::get(format!("{}/a", mock_server.scope_uri("alpha")))
        .await
        .unwrap();

    // Assert
    assert!(mock_server
        .scenario("alpha")
        .await
        .unwrap()
        .expectations()
        .is_empty());
    assert_eq!(mock_server.scenario("beta").await.unwrap(), scenario);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_on_one_scope_consume_a_pool_step_once() {
    // Arrange - a second, unrelated step keeps the pool from becoming empty
    let mock_server = MockServer::start().await;
    let scenario = Scenario::new(Mode::Pool)
        .with(Expectation::given("GET", "/a"))
        .with(Expectation::given("GET", "/other"));
    mock_server.set_scenario("default", scenario).await;
    let client = reqwest::Client::new();
    let n_requests = 32;

    // Act
    let handles: Vec<_> = (0..n_requests)
        .map(|_| {
            let client = client.clone();
            let uri = format!("{}/a", &mock_server.uri());
            tokio::spawn(async move {
                let response = client.get(uri).send().await.unwrap();
                let status = response.status();
                (status, json_of(response).await)
            })
        })
        .collect();
    let mut outcomes = vec![];
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    // Assert
    let n_ok = outcomes
        .iter()
        .filter(|(status, _)| *status == StatusCode::OK)
        .count();
    assert_eq!(n_ok, 1);
    for (status, body) in outcomes.iter().filter(|(status, _)| *status != StatusCode::OK) {
        assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "no_match_any_remaining_step");
    }
    let live = mock_server.scenario("default").await.unwrap();
    assert_eq!(live.expectations(), &[Expectation::given("GET", "/other")][..]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_on_one_scope_count_every_fixture_hit() {
    // Arrange
    let mock_server = MockServer::start().await;
    mock_server
        .set_scenario(
            "default",
            Scenario::new(Mode::Fixture).with(Expectation::given("GET", "/a")),
        )
        .await;
    let client = reqwest::Client::new();
    let n_requests = 50;

    // Act
    let handles: Vec<_> = (0..n_requests)
        .map(|_| {
            let client = client.clone();
            let uri = format!("{}/a", &mock_server.uri());
            tokio::spawn(async move { client.get(uri).send().await.unwrap().status() })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    // Assert
    let live = mock_server.scenario("default").await.unwrap();
    assert_eq!(live.expectations()[0].hits(), n_requests);
}
