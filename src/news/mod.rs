pub mod mock;
pub mod newsapi;

use async_trait::async_trait;
use serde::Deserialize;

pub use newsapi::NewsApiClient;

/// One article, with every missing field already replaced by its default.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub author: String,
    pub source: String,
    pub description: String,
    pub url: String,
}

impl Article {
    /// Render the fixed five-line block handed to the assistant.
    pub fn format(&self) -> String {
        format!(
            "Title: {},\nAuthor: {},\nSource: {},\nDescription: {},\nURL: {}",
            self.title, self.author, self.source, self.description, self.url
        )
    }
}

/// Where the `get_news` tool gets its articles. Never fails: problems are
/// logged and show up as an empty list.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, topic: &str) -> Vec<String>;
}

// --- wire types ---

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// Fields are optional on the wire; `null` and absent are treated alike.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawArticle {
    title: Option<String>,
    author: Option<String>,
    source: Option<RawSource>,
    description: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title.unwrap_or_else(|| "No Title".to_string()),
            author: raw.author.unwrap_or_else(|| "Unknown Author".to_string()),
            source: raw
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown Source".to_string()),
            description: raw
                .description
                .unwrap_or_else(|| "No Description".to_string()),
            url: raw.url.unwrap_or_else(|| "No URL".to_string()),
        }
    }
}

/// Parse a search response body into formatted article blocks, keeping at most `limit`.
pub(crate) fn format_response(body: &str, limit: usize) -> serde_json::Result<Vec<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .articles
        .into_iter()
        .take(limit)
        .map(|raw| Article::from(raw).format())
        .collect())
}
