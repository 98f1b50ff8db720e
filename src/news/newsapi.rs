use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use url::Url;

use super::{NewsSource, format_response};
use crate::config::NewsConfig;

/// Keyword search against the NewsAPI `/v2/everything` endpoint.
pub struct NewsApiClient {
    client: Client,
    config: NewsConfig,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(config: NewsConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn search_url(&self, topic: &str) -> Result<Url, url::ParseError> {
        let page_size = self.config.page_size.to_string();
        Url::parse_with_params(
            &format!("{}/v2/everything", self.config.base_url),
            &[
                ("q", topic),
                ("apiKey", self.config.api_key.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
    }

    async fn try_fetch(&self, topic: &str) -> Result<Vec<String>, String> {
        let url = self
            .search_url(topic)
            .map_err(|e| format!("invalid news URL: {e}"))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(format!("unable to fetch news (status code: {})", status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read body: {e}"))?;

        format_response(&body, self.config.page_size)
            .map_err(|e| format!("failed to parse news response: {e}"))
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch(&self, topic: &str) -> Vec<String> {
        match self.try_fetch(topic).await {
            Ok(articles) => {
                tracing::info!(topic, count = articles.len(), "fetched news");
                articles
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, "news lookup failed");
                Vec::new()
            }
        }
    }
}
