use serde::{Deserialize, Serialize};

/// Publisher reference as returned by the headlines API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A headline article.
///
/// Field names follow the headlines API wire format so articles can be sent to
/// the browser and posted back unchanged. `topic` and `topic_name` are stamped
/// on by [`crate::news::NewsClient::fetch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Option<Source>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "topic_name", skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
}

impl Article {
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    /// First `max_chars` characters of the body, cut on a char boundary.
    pub fn content_excerpt(&self, max_chars: usize) -> Option<String> {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| c.chars().take(max_chars).collect())
    }

    pub fn tag_topic(&mut self, topic: &str, topic_name: String) {
        self.topic = Some(topic.to_string());
        self.topic_name = Some(topic_name);
    }
}

/// Articles picked by the user plus their free-text preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub preferences: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
    Success,
}

/// How the returned content was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub status: SynthesisStatus,
    pub content: String,
    pub articles_count: usize,
    pub generation_method: GenerationMethod,
    /// Why the model output was not used; diagnostics only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}
