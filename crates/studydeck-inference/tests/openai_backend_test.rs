//! HTTP-level tests for the OpenAI-compatible backend against a mock server.

use serde_json::json;
use studydeck_core::{Error, GenerationBackend};
use studydeck_inference::openai::{OpenAIBackend, OpenAIConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        gen_model: "test-gen".to_string(),
        temperature: 0.7,
        timeout_seconds: 5,
        skip_tls_verify: false,
    })
    .expect("Failed to create backend")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"},
            {"index": 1, "message": {"role": "assistant", "content": "second choice"}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_returns_first_choice_verbatim() {
    let server = MockServer::start().await;
    let raw = "  [{\"question\": \"Q\", \"answer\": \"A\"}]\n";

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-gen",
            "messages": [
                {"role": "system", "content": "SYSTEM"},
                {"role": "user", "content": "cell notes"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(raw)))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend_for(&server)
        .generate_with_system("SYSTEM", "cell notes")
        .await
        .unwrap();
    assert_eq!(text, raw);
}

#[tokio::test]
async fn test_sends_configured_temperature() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "temperature": 0.25 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[]")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        temperature: 0.25,
        ..Default::default()
    })
    .unwrap();
    backend.generate_with_system("s", "p").await.unwrap();
}

#[tokio::test]
async fn test_non_success_status_is_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "slow down", "type": "rate_limit_exceeded", "code": null}
        })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate_with_system("s", "p")
        .await
        .unwrap_err();
    match err {
        Error::Generation(msg) => {
            assert!(msg.contains("Rate limit exceeded"));
            assert!(msg.contains("slow down"));
        }
        other => panic!("expected Generation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate_with_system("s", "p")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
}

#[tokio::test]
async fn test_empty_choices_is_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .generate_with_system("s", "p")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_generation_error() {
    let backend = OpenAIBackend::new(OpenAIConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    })
    .unwrap();

    let err = backend.generate_with_system("s", "p").await.unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
}

#[tokio::test]
async fn test_health_check_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    assert!(backend_for(&server).health_check().await.unwrap());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    assert!(!backend_for(&down).health_check().await.unwrap());
}
