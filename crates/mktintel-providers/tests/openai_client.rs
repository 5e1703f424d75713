//! Integration tests for `OpenAiClient` using wiremock HTTP mocks.

use std::time::Duration;

use mktintel_providers::{OpenAiClient, ProviderError, TextGenerator};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenAiClient {
    OpenAiClient::with_base_url("sk-test", "gpt-4o-mini", Duration::from_secs(5), base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn generate_text_returns_first_choice() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "{\"score\": 72}" } }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "max_tokens": 300,
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let text = client
        .generate_text("score this", 300)
        .await
        .expect("should return content");
    assert_eq!(text, "{\"score\": 72}");
}

#[tokio::test]
async fn empty_choices_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate_text("hi", 10).await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn rate_limit_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.generate_text("hi", 10).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 429, .. }));
    assert_eq!(err.provider(), "openai");
}
