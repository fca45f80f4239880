use mockito::Matcher;
use newsdigest::llm::gemini::GeminiProvider;
use newsdigest::llm::{LlmError, LlmProvider, LlmRequest};

const GENERATE_PATH: &str = "/models/gemini-pro:generateContent";

#[tokio::test]
async fn test_gemini_generate_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "fake-google-key")
        .match_body(Matcher::PartialJsonString(
            r#"{"contents": [{"role": "user", "parts": [{"text": "Write something"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r##"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "# Headline\n"}, {"text": "Body text"}]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 12,
                    "candidatesTokenCount": 30,
                    "totalTokenCount": 42
                },
                "modelVersion": "gemini-pro-001"
            }"##,
        )
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-google-key", "gemini-pro");
    let response = provider
        .generate(LlmRequest::new("Write something"))
        .await
        .expect("generation succeeds");

    assert_eq!(response.content, "# Headline\nBody text");
    assert_eq!(response.usage.total_tokens, 42);
    assert_eq!(response.usage.completion_tokens, 30);
    assert_eq!(response.model, "gemini-pro-001");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_blocked_prompt_is_empty_response() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-google-key", "gemini-pro");
    let result = provider.generate(LlmRequest::new("Write something")).await;

    assert!(matches!(result, Err(LlmError::EmptyResponse)));
}

#[tokio::test]
async fn test_gemini_quota_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(429)
        .with_body(r#"{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let provider = GeminiProvider::new(server.url(), "fake-google-key", "gemini-pro");
    let err = provider
        .generate(LlmRequest::new("Write something"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("429"));
    assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));
}
