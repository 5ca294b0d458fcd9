//! HTTP-level tests for the Ollama backend against a wiremock server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paperflow_core::{EmbeddingBackend, Error, GenerationBackend};
use paperflow_inference::{OllamaBackend, OllamaConfig};

fn config_for(server: &MockServer) -> OllamaConfig {
    OllamaConfig {
        base_url: server.uri(),
        generation_model: "test-gen".to_string(),
        embedding_model: "test-embed".to_string(),
        embedding_dimension: 4,
        gen_timeout_secs: 5,
        embed_timeout_secs: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_generate_parses_chat_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "test-gen", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "invoice"}
        })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&config_for(&server));
    let reply = backend.generate("classify this").await.unwrap();
    assert_eq!(reply, "invoice");
}

#[tokio::test]
async fn test_generate_json_sets_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"format": "json", "think": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "{\"invoice_number\": \"A-100\"}"}
        })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&config_for(&server));
    let reply = backend.generate_json("extract fields").await.unwrap();
    assert!(reply.contains("A-100"));
}

#[tokio::test]
async fn test_generate_maps_server_error_to_inference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&config_for(&server));
    let err = backend.generate("hello").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)), "{err}");
}

#[tokio::test]
async fn test_embed_texts_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": "test-embed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3, 0.4], [0.5, 0.6, 0.7, 0.8]]
        })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&config_for(&server));
    let vectors = backend
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].as_slice(), &[0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test]
async fn test_embed_count_mismatch_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3, 0.4]]
        })))
        .mount(&server)
        .await;

    let backend = OllamaBackend::new(&config_for(&server));
    let err = backend
        .embed_texts(&["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[tokio::test]
async fn test_embed_empty_input_skips_request() {
    // No mock mounted: a request would fail the test.
    let server = MockServer::start().await;
    let backend = OllamaBackend::new(&config_for(&server));
    let vectors = backend.embed_texts(&[]).await.unwrap();
    assert!(vectors.is_empty());
}
