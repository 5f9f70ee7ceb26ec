//! Contract tests for the hosted model API client.
//!
//! Verifies the request shape, auth header, and error mapping against a
//! mock HTTP server, plus the dialogue engine's apology fallback when the
//! API is unreachable.

use ankid::TutorError;
use ankid::config::ModelConfig;
use ankid::llm::{GenerativeApi, LanguageModel};
use ankid::tutor::{APOLOGY, DialogueEngine};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server_uri: &str) -> ModelConfig {
    ModelConfig {
        api_url: server_uri.to_owned(),
        api_key: "test-key".to_owned(),
        ..ModelConfig::default()
    }
}

#[tokio::test]
async fn generate_posts_prompt_and_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": "What is gravity?" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Gravity is a force." }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GenerativeApi::new(&config_for(&server.uri())).expect("client");
    let reply = client.generate("What is gravity?").await.expect("reply");
    assert_eq!(reply, "Gravity is a force.");
}

#[tokio::test]
async fn non_success_status_maps_to_a_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("key not valid"))
        .mount(&server)
        .await;

    let client = GenerativeApi::new(&config_for(&server.uri())).expect("client");
    match client.generate("hello").await {
        Err(TutorError::Model(msg)) => {
            assert!(msg.contains("403"), "unexpected message: {msg}");
            assert!(msg.contains("key not valid"));
        }
        other => panic!("expected model error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_maps_to_a_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = GenerativeApi::new(&config_for(&server.uri())).expect("client");
    assert!(matches!(
        client.generate("hello").await,
        Err(TutorError::Model(_))
    ));
}

#[tokio::test]
async fn body_without_candidates_maps_to_a_model_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let client = GenerativeApi::new(&config_for(&server.uri())).expect("client");
    assert!(matches!(
        client.generate("hello").await,
        Err(TutorError::Model(_))
    ));
}

#[tokio::test]
async fn engine_absorbs_api_failure_into_the_apology_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = GenerativeApi::new(&config_for(&server.uri())).expect("client");
    let mut engine = DialogueEngine::new(Arc::new(client));

    let reply = engine.send_turn("What is gravity?").await.expect("reply");
    assert!(reply.fallback);
    assert_eq!(reply.text, APOLOGY);
    // Greeting + user turn + apology.
    assert_eq!(engine.turns().len(), 3);
}
