// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply dispatch against a stubbed Bot API.

use parley_config::model::TelegramConfig;
use parley_core::{ParleyError, ReplyDispatcher};
use parley_telegram::TelegramDispatcher;
use serde_json::json;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_MESSAGE: &str = r"(?i)^/bot[^/]+/sendmessage$";

fn dispatcher(server: &MockServer) -> TelegramDispatcher {
    TelegramDispatcher::new(&TelegramConfig {
        bot_token: Some("123456:TEST".into()),
        api_url: Some(server.uri()),
        ..TelegramConfig::default()
    })
    .unwrap()
}

fn sent_message(message_id: i64) -> serde_json::Value {
    json!({
        "ok": true,
        "result": {
            "message_id": message_id,
            "date": 1_714_557_600,
            "chat": {"id": -100_200, "type": "supergroup", "title": "Гараж"},
            "from": {"id": 777, "is_bot": true, "first_name": "Жорик", "username": "parley_bot"},
            "text": "часть ответа"
        }
    })
}

fn server_error() -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_json(json!({
        "ok": false,
        "error_code": 500,
        "description": "Internal Server Error"
    }))
}

/// Three paragraphs that cannot share one message.
fn long_reply() -> String {
    ["а".repeat(3000), "б".repeat(3000), "в".repeat(3000)].join("\n\n")
}

#[tokio::test]
async fn later_chunk_failure_keeps_first_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(SEND_MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(501)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(SEND_MESSAGE))
        .respond_with(server_error())
        .with_priority(2)
        .mount(&server)
        .await;

    let receipt = dispatcher(&server)
        .send(-100_200, &long_reply(), 42)
        .await
        .expect("first chunk was delivered");

    assert_eq!(receipt.message_id, 501);
    assert_eq!(receipt.author_user_id, Some(777));
    assert_eq!(receipt.author_username.as_deref(), Some("parley_bot"));

    // The third chunk is not attempted after the second fails.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn first_chunk_failure_is_a_dispatch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(SEND_MESSAGE))
        .respond_with(server_error())
        .mount(&server)
        .await;

    let err = dispatcher(&server)
        .send(-100_200, &long_reply(), 42)
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Dispatch { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn first_chunk_quotes_the_inbound_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(SEND_MESSAGE))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(600)))
        .mount(&server)
        .await;

    let receipt = dispatcher(&server)
        .send(-100_200, &long_reply(), 42)
        .await
        .unwrap();
    assert_eq!(receipt.message_id, 600);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let bodies: Vec<serde_json::Value> = requests
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(bodies[0]["reply_parameters"]["message_id"], 42);
    assert!(bodies[1].get("reply_parameters").is_none());
    assert!(bodies[2].get("reply_parameters").is_none());
}
