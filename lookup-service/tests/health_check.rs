mod common;

use common::TestApp;
use lookup_service::services::MockStore;
use reqwest::{Client, StatusCode};
use service_core::middleware::REQUEST_ID_HEADER;
use std::sync::Arc;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn(Arc::new(MockStore::new())).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "lookup-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn(Arc::new(MockStore::new())).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn readiness_check_fails_when_store_is_unreachable() {
    let app = TestApp::spawn(Arc::new(MockStore::new().unavailable())).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/ready", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Service unavailable");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn(Arc::new(MockStore::new())).await;
    let client = Client::new();

    let response = client
        .get(&format!("{}/health", app.address))
        .header(REQUEST_ID_HEADER, "trace-me")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "trace-me"
    );
}
