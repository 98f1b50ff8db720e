//! Typed configuration for the two vendor APIs and the poll loop.
//!
//! Nothing in the library reads the process environment. `main` builds a
//! [`Config`] from CLI flags (with env fallbacks), calls [`Config::validate`],
//! and hands the pieces to the constructors that need them.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{
    DEFAULT_MODEL, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RUN_TIMEOUT,
    NEWS_API_URL, NEWS_PAGE_SIZE, OPENAI_API_URL,
};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("missing {0}")]
    MissingKey(&'static str),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("run timeout ({timeout:?}) must be at least the poll interval ({interval:?})")]
    TimeoutTooShort { timeout: Duration, interval: Duration },

    #[error("page size must be between 1 and 100, got {0}")]
    PageSize(usize),
}

/// News search endpoint settings.
#[derive(Clone)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
}

impl NewsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: NEWS_API_URL.to_string(),
            page_size: NEWS_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for NewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// OpenAI Assistants endpoint settings.
#[derive(Clone)]
pub struct AssistantConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl AssistantConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// How often and for how long a run is polled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_RUN_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub news: NewsConfig,
    pub assistant: AssistantConfig,
    pub poll: PollConfig,
}

impl Config {
    pub fn new(news_api_key: impl Into<String>, openai_api_key: impl Into<String>) -> Self {
        Self {
            news: NewsConfig::new(news_api_key),
            assistant: AssistantConfig::new(openai_api_key),
            poll: PollConfig::default(),
        }
    }

    /// Reject configurations that would only fail once the first remote call is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("news API key (NEWS_API_KEY)"));
        }
        if self.assistant.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("OpenAI API key (OPENAI_API_KEY)"));
        }
        if self.news.page_size == 0 || self.news.page_size > 100 {
            return Err(ConfigError::PageSize(self.news.page_size));
        }
        if self.poll.interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll.timeout < self.poll.interval {
            return Err(ConfigError::TimeoutTooShort {
                timeout: self.poll.timeout,
                interval: self.poll.interval,
            });
        }
        Ok(())
    }
}
