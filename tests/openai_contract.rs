//! OpenAI chat completions contract tests.
//!
//! Verify the request shape the explain/chat client sends and how provider
//! responses and errors are mapped.

use kelime::config::KelimeConfig;
use kelime::error::KelimeError;
use kelime::llm::{
    ChatMessage, CompletionClient, ExplainMode, ExplainRequest, OpenAiClient,
};
use kelime::settings::Settings;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAiClient {
    let mut config = KelimeConfig::default();
    config.llm.api_key = Some("sk-test-key".to_owned());
    config.llm.base_url = server.uri();
    OpenAiClient::new(Settings::in_memory(config))
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn explain_sends_model_messages_and_sampling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test-key"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.4,
            "max_tokens": 400
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "  **Teknik Açıklama:**\nEş zamanlılık kilidi.\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .explain(&ExplainRequest {
            selected_text: "mutex".to_owned(),
            context: "Guard shared state with a mutex.".to_owned(),
            mode: ExplainMode::Explain,
        })
        .await
        .expect("explain succeeds");

    assert_eq!(reply, "**Teknik Açıklama:**\nEş zamanlılık kilidi.");

    let requests = server.received_requests().await.expect("recorded");
    let body: serde_json::Value = requests[0].body_json().expect("json body");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    let user = body["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(user.contains("\"mutex\""));
    assert!(user.contains("Guard shared state with a mutex."));
}

#[tokio::test]
async fn chat_forwards_history_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "Örnek verir misin?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Tabii.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .chat(&[ChatMessage::system("sys"), ChatMessage::user("Örnek verir misin?")])
        .await
        .expect("chat succeeds");
    assert_eq!(reply, "Tabii.");
}

#[tokio::test]
async fn error_body_maps_to_upstream_with_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided: sk-test***",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .expect_err("401 is an error");

    match err {
        KelimeError::Upstream { service, message } => {
            assert_eq!(service, "openai");
            assert_eq!(message, "Incorrect API key provided: sk-test***");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_without_body_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .expect_err("503 is an error");
    assert_eq!(err.to_string(), "openai error: HTTP 503");
}

#[tokio::test]
async fn response_without_choices_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(&[ChatMessage::user("hi")])
        .await
        .expect_err("no choices");
    assert!(matches!(err, KelimeError::Parse(_)));
}

#[tokio::test]
async fn hung_upstream_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = KelimeConfig::default();
    config.llm.api_key = Some("sk-test-key".to_owned());
    config.llm.base_url = server.uri();
    config.http.timeout_secs = 1;
    let client = OpenAiClient::new(Settings::in_memory(config));

    let err = client
        .complete(&[ChatMessage::user("hi")])
        .await
        .expect_err("timeout");
    assert!(matches!(err, KelimeError::Upstream { service: "openai", .. }));
}
