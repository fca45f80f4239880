use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::LlmConfig;

/// Core trait for generative text providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// A request that relies on the provider's defaults for everything but the prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Ways a provider call can fail. Every variant is a provider-side problem
/// (network, quota, bad payload); callers may treat all of them as recoverable.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse LLM response: {0}")]
    Malformed(String),

    #[error("No text in AI response")]
    EmptyResponse,
}

pub mod gemini;
pub mod remote;
pub mod synthesis;

/// Build the provider selected by `llm.adapter`.
///
/// Returns `Ok(None)` for adapter "none"; a missing API key is an error so the
/// caller can log why generation will always use the template fallback.
pub fn provider_from_config(cfg: &LlmConfig) -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    let adapter = cfg.adapter();
    if adapter == "none" {
        return Ok(None);
    }

    let api_key = cfg.api_key().with_context(|| {
        format!(
            "LLM API key not set (env var '{}')",
            cfg.api_key_env.as_deref().unwrap_or(cfg.default_api_key_env())
        )
    })?;
    let timeout_secs = cfg.timeout_seconds.unwrap_or(30);
    let max_tokens = cfg.max_tokens.unwrap_or(2048);
    let temperature = cfg.temperature.unwrap_or(0.7);

    let provider: Arc<dyn LlmProvider> = match adapter {
        "gemini" => {
            let model = cfg.model.clone().unwrap_or_else(|| "gemini-pro".to_string());
            let base_url = cfg
                .api_url
                .clone()
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string());
            Arc::new(
                gemini::GeminiProvider::new(base_url, api_key, model)
                    .with_defaults(timeout_secs, max_tokens, temperature),
            )
        }
        "remote" => {
            let model = cfg.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            let api_url = cfg
                .api_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());
            Arc::new(
                remote::RemoteLlmProvider::new(api_url, api_key, model)
                    .with_defaults(timeout_secs, max_tokens, temperature),
            )
        }
        other => anyhow::bail!("Unknown LLM adapter type: {}", other),
    };

    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(adapter: &str, key: Option<&str>) -> LlmConfig {
        LlmConfig {
            adapter: Some(adapter.to_string()),
            api_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn none_adapter_builds_nothing() {
        assert!(provider_from_config(&cfg("none", None)).unwrap().is_none());
    }

    #[test]
    fn missing_key_is_reported() {
        let err = provider_from_config(&cfg("gemini", None)).err().expect("error");
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn default_models_per_adapter() {
        let gemini = provider_from_config(&cfg("gemini", Some("k"))).unwrap().unwrap();
        assert_eq!(gemini.model(), "gemini-pro");
        let remote = provider_from_config(&cfg("remote", Some("k"))).unwrap().unwrap();
        assert_eq!(remote.model(), "gpt-4o-mini");
    }

    #[test]
    fn unknown_adapter_is_rejected() {
        assert!(provider_from_config(&cfg("carrier-pigeon", Some("k"))).is_err());
    }
}
