mod common;

use common::TestApp;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn plan_request_is_forwarded_as_json() {
    let request = json!({ "body_type": "ectomorph", "goal": "bulk", "duration": 12 });

    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-plan"))
        .and(header("content-type", "application/json"))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "plan": { "weeks": 12, "sessions_per_week": 4 }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::spawn(Some(upstream.uri())).await;

    let response = app
        .client
        .post(app.url("/api/generate-plan"))
        .json(&request)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["plan"]["weeks"], 12);
}

#[tokio::test]
async fn base_url_trailing_slash_is_not_duplicated() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-plan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "plan": [] })))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = TestApp::spawn(Some(format!("{}/", upstream.uri()))).await;

    let response = app
        .client
        .post(app.url("/api/generate-plan"))
        .json(&json!({ "goal": "cut" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_json_body_is_rejected_before_relaying() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let app = TestApp::spawn(Some(upstream.uri())).await;

    let response = app
        .client
        .post(app.url("/api/generate-plan"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn plan_upstream_timeout_is_504() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-plan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "plan": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&upstream)
        .await;

    let app = TestApp::spawn_with_timeout(Some(upstream.uri()), 1).await;

    let response = app
        .client
        .post(app.url("/api/generate-plan"))
        .json(&json!({ "goal": "cut" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Request timeout");
}

#[tokio::test]
async fn plan_upstream_html_error_is_not_turned_into_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate-plan"))
        .respond_with(
            ResponseTemplate::new(500).set_body_raw("Internal Server Error", "text/plain"),
        )
        .mount(&upstream)
        .await;

    let app = TestApp::spawn(Some(upstream.uri())).await;

    let response = app
        .client
        .post(app.url("/api/generate-plan"))
        .json(&json!({ "goal": "cut" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid response from inference service");
    assert_eq!(body["raw"], "Internal Server Error");
}
