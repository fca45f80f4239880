// Personalized content synthesis
use std::fmt::Write;

use tracing::{info, warn};

use super::{LlmError, LlmProvider, LlmRequest};
use crate::models::{Article, GenerationMethod, SynthesisResult, SynthesisStatus};

/// Characters of article body forwarded to the model
pub const CONTENT_EXCERPT_CHARS: usize = 500;
const DEFAULT_PREFERENCES: &str = "General interest in selected topics";
const DEFAULT_TOPIC: &str = "General";

/// Produce a personalized summary of `articles`.
///
/// Tries the model once; any [`LlmError`] or an empty payload falls back to
/// [`fallback_content`]. Always returns a success result.
pub async fn synthesize(
    provider: Option<&dyn LlmProvider>,
    articles: &[Article],
    preferences: Option<&str>,
) -> SynthesisResult {
    let preferences = preferences.filter(|p| !p.is_empty());

    let failure = match provider {
        Some(provider) => match generate(provider, articles, preferences).await {
            Ok(text) => {
                return SynthesisResult {
                    status: SynthesisStatus::Success,
                    content: text,
                    articles_count: articles.len(),
                    generation_method: GenerationMethod::Ai,
                    ai_error: None,
                };
            }
            Err(e) => e.to_string(),
        },
        None => "no generative model configured".to_string(),
    };

    warn!(error = %failure, articles = articles.len(), "AI generation unavailable, using template fallback");
    SynthesisResult {
        status: SynthesisStatus::Success,
        content: fallback_content(articles, preferences),
        articles_count: articles.len(),
        generation_method: GenerationMethod::Fallback,
        ai_error: Some(failure),
    }
}

async fn generate(
    provider: &dyn LlmProvider,
    articles: &[Article],
    preferences: Option<&str>,
) -> Result<String, LlmError> {
    let response = provider
        .generate(LlmRequest::new(build_prompt(articles, preferences)))
        .await?;
    if response.content.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    info!(
        model = %response.model,
        tokens = response.usage.total_tokens,
        "AI content generation successful"
    );
    Ok(response.content)
}

/// Prompt listing every article followed by the writing instructions.
pub fn build_prompt(articles: &[Article], preferences: Option<&str>) -> String {
    let mut articles_text = String::new();
    for (i, article) in articles.iter().enumerate() {
        let content = article
            .content_excerpt(CONTENT_EXCERPT_CHARS)
            .unwrap_or_else(|| "No content".to_string());
        let _ = write!(
            articles_text,
            "\nArticle {}:\nTitle: {}\nDescription: {}\nContent: {}...\nSource: {}\n---\n",
            i + 1,
            article.title.as_deref().unwrap_or("No title"),
            article.description.as_deref().unwrap_or("No description"),
            content,
            article.source_name().unwrap_or("Unknown"),
        );
    }

    format!(
        r#"
You are an AI content creator that generates personalized news summaries and insights.

Based on the following news articles that the user has selected as interesting, create a comprehensive, engaging, and personalized content piece that:

1. Summarizes the key points from all articles
2. Identifies common themes and trends
3. Provides unique insights and analysis
4. Connects the stories in a meaningful way
5. Offers a personalized perspective based on the user's interests

Selected Articles:
{}

User Preferences: {}

Please create a well-structured, engaging article (800-1200 words) that synthesizes these news stories into valuable, personalized content. Include:
- An engaging headline
- A compelling introduction
- Main insights and analysis
- Key takeaways
- A thoughtful conclusion

Format the response as a proper article with clear sections.
"#,
        articles_text,
        preferences.unwrap_or(DEFAULT_PREFERENCES)
    )
}

/// Group articles by topic name, keeping first-seen topic order and input order within a topic.
fn group_by_topic(articles: &[Article]) -> Vec<(&str, Vec<&Article>)> {
    let mut groups: Vec<(&str, Vec<&Article>)> = Vec::new();
    for article in articles {
        let topic = article.topic_name.as_deref().unwrap_or(DEFAULT_TOPIC);
        match groups.iter_mut().find(|(name, _)| *name == topic) {
            Some((_, members)) => members.push(article),
            None => groups.push((topic, vec![article])),
        }
    }
    groups
}

/// Template summary used when the model cannot be used
pub fn fallback_content(articles: &[Article], preferences: Option<&str>) -> String {
    let mut content = String::from("# Your Personalized News Summary\n\n");

    if let Some(prefs) = preferences.filter(|p| !p.is_empty()) {
        let _ = write!(content, "*Based on your interests: {}*\n\n", prefs);
    }

    let _ = write!(
        content,
        "We've analyzed {} articles you selected and created this personalized summary:\n\n",
        articles.len()
    );

    for (topic, members) in group_by_topic(articles) {
        let _ = write!(content, "## {} News\n\n", topic);
        for article in members {
            let _ = write!(
                content,
                "### {}\n*Source: {}*\n\n{}\n\n",
                article.title.as_deref().unwrap_or("Untitled"),
                article.source_name().unwrap_or("Unknown Source"),
                article.description.as_deref().unwrap_or("No description available"),
            );
        }
    }

    content.push_str("## Key Insights\n\n");
    content.push_str("- These stories reflect current trends in the topics you're interested in\n");
    content.push_str("- The news sources provide diverse perspectives on important developments\n");
    content.push_str("- Stay informed with these carefully selected articles that match your preferences\n\n");

    content.push_str("## What This Means For You\n\n");
    content.push_str("Based on your selected articles, here are the key takeaways:\n\n");
    content.push_str("1. **Stay Updated**: These stories represent the most current developments in your areas of interest\n");
    content.push_str("2. **Informed Decisions**: Use these insights to make better personal and professional choices\n");
    content.push_str("3. **Broader Perspective**: Understanding these trends helps you see the bigger picture\n\n");

    content.push_str("*This summary was generated based on your article selections and preferences.*");
    content
}
