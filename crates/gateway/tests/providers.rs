use std::time::Duration;

use chat_gateway::{ChatRouter, ProviderConfig, ProviderKind, StopReason, build_provider};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn router_for(kind: ProviderKind, server: &MockServer) -> ChatRouter {
    let config = ProviderConfig::new("test_key")
        .base_url(format!("{}/v1", server.uri()))
        .timeout(Duration::from_millis(500));
    ChatRouter::new(build_provider(kind, config).expect("Failed to build provider"))
}

const HELLO: &[u8] = br#"{"messages":[{"role":"user","content":"Hello, frog!"}],"max_tokens":64}"#;

#[tokio::test]
async fn test_openai_compatible_round_trip() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test_key"))
        .and(body_partial_json(json!({
            "model": "meta/llama-4-scout-17b-16e-instruct",
            "messages": [{ "role": "user", "content": "Hello, frog!" }],
            "max_tokens": 64,
            "stream": false,
            "frequency_penalty": 0.0,
            "presence_penalty": 0.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1234567890,
            "model": "meta/llama-4-scout-17b-16e-instruct",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Ribbit! Hello there." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = router_for(ProviderKind::OpenAiCompatible, &server)
        .handle_chat(HELLO)
        .await
        .expect("chat should succeed");

    assert_eq!(response.id, "chatcmpl-123");
    assert_eq!(response.text(), Some("Ribbit! Hello there."));
    assert_eq!(response.stop_reason, StopReason::Other("stop".to_string()));
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 5);
}

#[tokio::test]
async fn test_native_messages_round_trip() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test_key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "user", "content": "Hello, frog!" }],
            "max_tokens": 64
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_abc",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5-20250929",
            "content": [{ "type": "text", "text": "Hello! I am not a frog." }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 9, "output_tokens": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = router_for(ProviderKind::NativeMessages, &server)
        .handle_chat(HELLO)
        .await
        .expect("chat should succeed");

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "id": "msg_abc",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": "Hello! I am not a frog." }],
            "model": "claude-sonnet-4-5-20250929",
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 9, "output_tokens": 7 }
        })
    );
}

#[tokio::test]
async fn test_empty_messages_never_reach_upstream() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = router_for(ProviderKind::OpenAiCompatible, &server)
        .handle_chat(br#"{"messages":[],"max_tokens":512}"#)
        .await
        .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "messages must not be empty");
}

#[tokio::test]
async fn test_timeout_is_transport_error_without_retry() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({ "choices": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = router_for(ProviderKind::OpenAiCompatible, &server)
        .handle_chat(HELLO)
        .await
        .unwrap_err();

    assert_eq!(err.status, 500);
    assert!(err.message.contains("timed out"), "{}", err.message);
    let body = serde_json::to_value(&err).unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_rate_limit_passes_through() {
    init_logging();
    let server = MockServer::start().await;
    let upstream_body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"Number of requests has exceeded your rate limit"}}"#;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string(upstream_body))
        .expect(1)
        .mount(&server)
        .await;

    let err = router_for(ProviderKind::NativeMessages, &server)
        .handle_chat(HELLO)
        .await
        .unwrap_err();

    assert_eq!(err.status, 429);
    assert_eq!(err.message, "Number of requests has exceeded your rate limit");
    assert_eq!(err.provider_detail.as_deref(), Some(upstream_body));
}

#[tokio::test]
async fn test_connection_refused_is_500() {
    init_logging();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind temp port");
        listener.local_addr().expect("local addr").port()
    };
    let config = ProviderConfig::new("test_key")
        .base_url(format!("http://127.0.0.1:{port}/v1"))
        .timeout(Duration::from_millis(500));
    let router = ChatRouter::new(
        build_provider(ProviderKind::OpenAiCompatible, config).expect("Failed to build provider"),
    );

    let err = router.handle_chat(HELLO).await.unwrap_err();
    assert_eq!(err.status, 500);
    assert!(err.message.starts_with("upstream request failed"), "{}", err.message);
}

#[tokio::test]
async fn test_non_json_success_body_is_500() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = router_for(ProviderKind::OpenAiCompatible, &server)
        .handle_chat(HELLO)
        .await
        .unwrap_err();
    assert_eq!(err.status, 500);
    assert!(err.message.contains("malformed"), "{}", err.message);
}

#[tokio::test]
async fn test_model_hint_ignored_for_fixed_deployment() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "model": "meta/llama-4-scout-17b-16e-instruct" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "" }, "finish_reason": "length" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = router_for(ProviderKind::OpenAiCompatible, &server)
        .handle_chat(
            br#"{"model":"claude-sonnet-4-5-20250929","messages":[{"role":"user","content":"hi"}]}"#,
        )
        .await
        .expect("chat should succeed");

    assert_eq!(response.text(), Some(""));
    assert_eq!(response.content.len(), 1);
    assert_eq!(response.model, "meta/llama-4-scout-17b-16e-instruct");
}
