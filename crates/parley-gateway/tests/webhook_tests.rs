// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook endpoint behaviour, driven through the router with `oneshot`.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use parley_gateway::{GatewayState, build_router};
use parley_test_utils::{TEST_CHAT_ID, TestHarness};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const TOKEN: &str = "hook-secret";

fn update_json(update_id: i64, message_id: i64, text: &str) -> String {
    serde_json::json!({
        "update_id": update_id,
        "message": {
            "message_id": message_id,
            "date": Utc::now().timestamp(),
            "chat": {"id": TEST_CHAT_ID, "type": "supergroup", "title": "test chat"},
            "from": {"id": 42, "is_bot": false, "first_name": "Test", "username": "tester"},
            "text": text
        }
    })
    .to_string()
}

async fn post(state: &GatewayState, path: &str, body: String) -> StatusCode {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    build_router("/webhook", state.clone())
        .oneshot(request)
        .await
        .unwrap()
        .status()
}

async fn drain(state: &GatewayState) {
    state.tasks.close();
    state.tasks.wait().await;
}

async fn setup() -> (TestHarness, GatewayState) {
    let harness = TestHarness::builder().build().await.unwrap();
    let state = GatewayState::new(
        harness.coordinator.clone(),
        Some(TOKEN),
        CancellationToken::new(),
    );
    (harness, state)
}

#[tokio::test]
async fn wrong_token_is_forbidden() {
    let (harness, state) = setup().await;

    let status = post(&state, "/webhook/nope", update_json(1, 10, "привет")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    drain(&state).await;
    assert!(harness.messages(TEST_CHAT_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_configured_token_rejects_everything() {
    let harness = TestHarness::builder().build().await.unwrap();
    let state = GatewayState::new(harness.coordinator.clone(), None, CancellationToken::new());

    let status = post(&state, "/webhook/anything", update_json(1, 10, "привет")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (_harness, state) = setup().await;
    let status = post(&state, &format!("/webhook/{TOKEN}"), "{oops".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_without_message_is_acknowledged() {
    let (harness, state) = setup().await;
    let body = serde_json::json!({"update_id": 5, "my_chat_member": {}}).to_string();

    let status = post(&state, &format!("/webhook/{TOKEN}"), body).await;
    assert_eq!(status, StatusCode::OK);

    drain(&state).await;
    assert!(harness.messages(TEST_CHAT_ID).await.unwrap().is_empty());
}

#[tokio::test]
async fn addressed_update_is_stored_and_answered() {
    let (harness, state) = setup().await;

    let status = post(
        &state,
        &format!("/webhook/{TOKEN}"),
        update_json(1, 10, "Жорик, что думаешь о погоде?"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    drain(&state).await;
    let stored = harness.messages(TEST_CHAT_ID).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored[0].is_addressed_to_bot);
    assert!(stored[1].is_from_bot);
    assert_eq!(harness.dispatcher.sent().await.len(), 1);
    assert!(state.lanes.is_empty());
}

#[tokio::test]
async fn redelivery_through_the_webhook_is_idempotent() {
    let (harness, state) = setup().await;
    let path = format!("/webhook/{TOKEN}");

    for _ in 0..3 {
        let status = post(&state, &path, update_json(7, 70, "Жорик, ау")).await;
        assert_eq!(status, StatusCode::OK);
    }

    drain(&state).await;
    let stored = harness.messages(TEST_CHAT_ID).await.unwrap();
    assert_eq!(stored.iter().filter(|m| !m.is_from_bot).count(), 1);
    assert_eq!(harness.dispatcher.sent().await.len(), 1);
}

#[tokio::test]
async fn burst_in_one_chat_is_fully_stored() {
    let (harness, state) = setup().await;
    let path = format!("/webhook/{TOKEN}");

    for i in 0..10 {
        post(&state, &path, update_json(100 + i, 1000 + i, "болтаем дальше")).await;
    }

    drain(&state).await;
    assert_eq!(harness.messages(TEST_CHAT_ID).await.unwrap().len(), 10);
}

#[tokio::test]
async fn health_lists_components() {
    let (_harness, state) = setup().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = build_router("/webhook", state.clone())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["components"]["mock-generator"]["status"], "healthy");
    assert_eq!(json["components"]["failing-store"]["status"], "healthy");
}
