use std::time::Duration;

use common::{topics, Config};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::Article;

#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    #[error("News API key is not configured. Please check environment variables.")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status, or a body with `"status": "error"`
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse headlines response: {0}")]
    Malformed(String),
}

/// Result of fetching several topics: whatever was gathered plus per-topic failures
#[derive(Debug, Default)]
pub struct NewsBatch {
    pub articles: Vec<Article>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlinesResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    articles: Vec<Article>,
    message: Option<String>,
}

/// Client for the `top-headlines` endpoint
#[derive(Clone)]
pub struct NewsClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl NewsClient {
    /// Blank or placeholder keys leave the client unconfigured.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: common::usable_key(api_key.as_deref()).map(str::to_string),
            client: Client::new(),
        }
    }

    /// Build a client from the `[news_api]` section.
    pub fn from_config(config: &Config) -> Result<Self, NewsError> {
        let mut builder = Client::builder().user_agent(concat!("newsdigest/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.news_api.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            base_url: config.news_base_url().to_string(),
            api_key: config.news_api_key().map(str::to_string),
            client: builder.build()?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch top headlines for one category. `None` or the default category
    /// sends no category filter.
    pub async fn top_headlines(
        &self,
        category: Option<&str>,
        country: &str,
        page_size: u32,
    ) -> Result<Vec<Article>, NewsError> {
        let api_key = self.api_key.as_deref().ok_or(NewsError::MissingApiKey)?;
        let url = format!("{}/top-headlines", self.base_url.trim_end_matches('/'));
        let page_size = page_size.to_string();

        let mut request = self.client.get(&url).query(&[
            ("apiKey", api_key),
            ("country", country),
            ("pageSize", page_size.as_str()),
        ]);
        if let Some(category) = category.filter(|c| !topics::is_default_category(c)) {
            request = request.query(&[("category", category)]);
        }

        // Strip the URL from transport errors; it carries the API key
        let response = request.send().await.map_err(|e| NewsError::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::Http(e.without_url()))?;

        if !status.is_success() {
            // The API reports failures as JSON; fall back to the HTTP reason otherwise
            let message = serde_json::from_str::<HeadlinesResponse>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.to_string());
            return Err(NewsError::Api { status: status.as_u16(), message });
        }

        let parsed: HeadlinesResponse =
            serde_json::from_str(&body).map_err(|e| NewsError::Malformed(e.to_string()))?;
        if parsed.status != "ok" {
            return Err(NewsError::Api {
                status: status.as_u16(),
                message: parsed.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }
        Ok(parsed.articles)
    }

    /// Fetch every topic in order, tagging each article with its topic.
    ///
    /// Topics are requested one after another; a failing topic is recorded in
    /// `errors` and does not stop the batch. Without an API key nothing is sent.
    pub async fn fetch(
        &self,
        topic_ids: &[String],
        country: &str,
        page_size: u32,
    ) -> Result<NewsBatch, NewsError> {
        if !self.is_configured() {
            return Err(NewsError::MissingApiKey);
        }

        let mut batch = NewsBatch::default();
        for topic in topic_ids {
            info!(topic = %topic, country, "fetching headlines");
            match self.top_headlines(Some(topic), country, page_size).await {
                Ok(articles) if articles.is_empty() => {
                    info!(topic = %topic, "no articles found");
                }
                Ok(articles) => {
                    let topic_name = topics::display_name(topic);
                    info!(topic = %topic, count = articles.len(), "fetched headlines");
                    batch.articles.extend(articles.into_iter().map(|mut a| {
                        a.tag_topic(topic, topic_name.clone());
                        a
                    }));
                }
                Err(e) => {
                    let msg = format!("Error fetching {}: {}", topic, e);
                    warn!("{}", msg);
                    batch.errors.push(msg);
                }
            }
        }

        info!(total = batch.articles.len(), errors = batch.errors.len(), "headline batch complete");
        Ok(batch)
    }
}
