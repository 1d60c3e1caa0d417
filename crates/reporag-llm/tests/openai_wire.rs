use reporag_llm::openai::OpenAiProvider;
use reporag_llm::{LlmError, LlmProvider, Message};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        "sk-test".into(),
        format!("{}/v1/", server.uri()),
        "gpt-4o-mini".into(),
        512,
        Some("text-embedding-3-small".into()),
    )
}

#[tokio::test]
async fn chat_posts_messages_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "explain"},
                {"role": "user", "content": "fn main() {}"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Entry point."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = openai(&server)
        .chat(&[Message::system("explain"), Message::user("fn main() {}")])
        .await
        .unwrap();
    assert_eq!(answer, "Entry point.");
}

#[tokio::test]
async fn embed_returns_first_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(body_partial_json(serde_json::json!({
            "input": ["Chunk: x"],
            "model": "text-embedding-3-small"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"index": 0, "embedding": [0.25, -0.5, 1.0]}]
        })))
        .mount(&server)
        .await;

    let vector = openai(&server).embed("Chunk: x").await.unwrap();
    assert_eq!(vector, vec![0.25, -0.5, 1.0]);
}

#[tokio::test]
async fn azure_uses_deployment_path_and_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/ada-002/embeddings"))
        .and(query_param("api-version", "2024-02-01"))
        .and(header("api-key", "azure-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{"embedding": [1.0, 0.0]}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(
        "azure-secret".into(),
        server.uri(),
        "gpt-35".into(),
        256,
        Some("ada-002".into()),
    )
    .azure("2024-02-01");
    assert_eq!(provider.embed("hello").await.unwrap(), vec![1.0, 0.0]);
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let err = openai(&server).chat(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited { provider: "openai" }));
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = openai(&server).embed("hi").await.unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 500, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn context_length_rejection_is_not_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"code": "context_length_exceeded"}
        })))
        .mount(&server)
        .await;

    let err = openai(&server).chat(&[Message::user("huge")]).await.unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 400, .. }));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn empty_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = openai(&server).chat(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse { .. }));
}

#[tokio::test]
async fn malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json {{"))
        .mount(&server)
        .await;

    let err = openai(&server).chat(&[Message::user("hi")]).await.unwrap_err();
    assert!(matches!(err, LlmError::Json(_)));
}
