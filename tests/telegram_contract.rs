//! Telegram Bot API contract tests for the delivery channel.

use kelime::channels::{Credentials, DeliveryChannel, TelegramChannel};
use kelime::config::KelimeConfig;
use kelime::error::KelimeError;
use kelime::settings::Settings;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn channel_for(server: &MockServer) -> TelegramChannel {
    let mut config = KelimeConfig::default();
    config.telegram.base_url = server.uri();
    TelegramChannel::new(Settings::in_memory(config))
}

fn credentials() -> Credentials {
    Credentials {
        bot_token: "123:ABC".to_owned(),
        chat_id: "-100200300".to_owned(),
    }
}

#[tokio::test]
async fn send_posts_markdown_v2_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .and(body_json(json!({
            "chat_id": "-100200300",
            "text": "*1\\. heap*",
            "parse_mode": "MarkdownV2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 7}
        })))
        .expect(1)
        .mount(&server)
        .await;

    channel_for(&server)
        .send(&credentials(), "*1\\. heap*")
        .await
        .expect("delivered");
}

#[tokio::test]
async fn error_description_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = channel_for(&server)
        .send(&credentials(), "hi")
        .await
        .expect_err("400 is an error");

    match err {
        KelimeError::Upstream { service, message } => {
            assert_eq!(service, "telegram");
            assert_eq!(message, "Bad Request: chat not found");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_without_description_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = channel_for(&server)
        .send(&credentials(), "hi")
        .await
        .expect_err("502 is an error");
    assert_eq!(err.to_string(), "telegram error: HTTP 502");
}

#[tokio::test]
async fn failed_send_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:ABC/sendMessage"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "ok": false,
            "description": "Too Many Requests: retry after 5"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(channel_for(&server).send(&credentials(), "hi").await.is_err());
}

#[tokio::test]
async fn health_check_uses_get_me() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"id": 123, "is_bot": true, "username": "kelime_bot"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let healthy = channel_for(&server)
        .health_check(&credentials())
        .await
        .expect("probe runs");
    assert!(healthy);
}

#[tokio::test]
async fn health_check_reports_bad_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bot123:ABC/getMe"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let healthy = channel_for(&server)
        .health_check(&credentials())
        .await
        .expect("probe runs");
    assert!(!healthy);
}
