use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use newsdigest::llm::remote::RemoteLlmProvider;
use newsdigest::llm::synthesis::synthesize;
use newsdigest::llm::{LlmError, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use newsdigest::models::{Article, GenerationMethod, Source, SynthesisStatus};

/// Provider whose behaviour is fixed per test
enum Behaviour {
    Text(&'static str),
    Empty,
    Timeout,
}

struct StubProvider {
    behaviour: Behaviour,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubProvider {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for StubProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(request.prompt);
        match self.behaviour {
            Behaviour::Text(text) => Ok(LlmResponse {
                content: text.to_string(),
                usage: UsageMetadata::default(),
                model: "stub".to_string(),
            }),
            Behaviour::Empty => Ok(LlmResponse {
                content: "   ".to_string(),
                usage: UsageMetadata::default(),
                model: "stub".to_string(),
            }),
            Behaviour::Timeout => Err(LlmError::Timeout(Duration::from_secs(30))),
        }
    }

    fn model(&self) -> &str {
        "stub"
    }
}

fn article(title: &str, topic_name: &str) -> Article {
    Article {
        title: Some(title.to_string()),
        description: Some(format!("{} in brief", title)),
        content: Some("x".repeat(2000)),
        source: Some(Source { id: None, name: Some("Daily Planet".to_string()) }),
        topic: Some(topic_name.to_lowercase()),
        topic_name: Some(topic_name.to_string()),
        ..Default::default()
    }
}

fn sample() -> Vec<Article> {
    vec![
        article("Rocket lands", "Science"),
        article("Markets rally", "Business"),
        article("Comet spotted", "Science"),
    ]
}

#[tokio::test]
async fn test_ai_text_is_returned_verbatim() {
    let provider = StubProvider::new(Behaviour::Text("# A Great Day\nStory."));
    let articles = sample();

    let result = synthesize(Some(&provider), &articles, Some("space travel")).await;

    assert_eq!(result.status, SynthesisStatus::Success);
    assert_eq!(result.generation_method, GenerationMethod::Ai);
    assert_eq!(result.content, "# A Great Day\nStory.");
    assert_eq!(result.articles_count, 3);
    assert!(result.ai_error.is_none());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let prompt = provider.last_prompt.lock().unwrap().clone().expect("prompt sent");
    assert!(prompt.contains("User Preferences: space travel"));
    assert!(prompt.contains(&format!("Content: {}...", "x".repeat(500))));
    assert!(!prompt.contains(&"x".repeat(501)));
}

#[tokio::test]
async fn test_empty_text_falls_back() {
    let provider = StubProvider::new(Behaviour::Empty);
    let articles = sample();

    let result = synthesize(Some(&provider), &articles, None).await;

    assert_eq!(result.status, SynthesisStatus::Success);
    assert_eq!(result.generation_method, GenerationMethod::Fallback);
    assert_eq!(result.articles_count, 3);
    assert_eq!(result.ai_error.as_deref(), Some("No text in AI response"));
    assert!(result.content.starts_with("# Your Personalized News Summary"));
}

#[tokio::test]
async fn test_provider_error_falls_back_with_diagnostic() {
    let provider = StubProvider::new(Behaviour::Timeout);
    let articles = sample();

    let result = synthesize(Some(&provider), &articles, Some("")).await;

    assert_eq!(result.generation_method, GenerationMethod::Fallback);
    assert!(result.ai_error.as_deref().unwrap_or_default().contains("timed out"));
    assert!(!result.content.contains("Based on your interests"));

    // Science first (first seen), both science stories before Business
    let science = result.content.find("## Science News").unwrap();
    let business = result.content.find("## Business News").unwrap();
    let rocket = result.content.find("### Rocket lands").unwrap();
    let comet = result.content.find("### Comet spotted").unwrap();
    assert!(science < rocket && rocket < comet && comet < business);
}

#[tokio::test]
async fn test_without_provider_uses_fallback() {
    let articles = sample();
    let result = synthesize(None, &articles, Some("space travel")).await;

    assert_eq!(result.generation_method, GenerationMethod::Fallback);
    assert_eq!(result.ai_error.as_deref(), Some("no generative model configured"));
    assert!(result.content.contains("*Based on your interests: space travel*"));
    assert!(result.content.contains("*Source: Daily Planet*"));
}

#[tokio::test]
async fn test_count_and_content_hold_for_every_outcome() {
    for size in 1..=4 {
        let articles: Vec<Article> = (0..size)
            .map(|i| article(&format!("story {}", i), if i % 2 == 0 { "B" } else { "A" }))
            .collect();
        let providers = [
            StubProvider::new(Behaviour::Text("ok")),
            StubProvider::new(Behaviour::Empty),
            StubProvider::new(Behaviour::Timeout),
        ];
        for provider in &providers {
            let result = synthesize(Some(provider), &articles, None).await;
            assert_eq!(result.articles_count, size);
            assert!(!result.content.trim().is_empty());
        }
        let result = synthesize(None, &articles, None).await;
        assert_eq!(result.articles_count, size);
        assert!(!result.content.is_empty());
    }
}

#[tokio::test]
async fn test_http_quota_error_falls_back() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "gpt-4o-mini");
    let articles = sample();
    let result = synthesize(Some(&provider), &articles, None).await;

    assert_eq!(result.generation_method, GenerationMethod::Fallback);
    assert!(result.ai_error.as_deref().unwrap_or_default().contains("429"));
    mock.assert_async().await;
}
