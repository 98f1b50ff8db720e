use async_trait::async_trait;
use std::sync::Mutex;

use super::NewsSource;

/// A canned news source for tests. Returns the same articles for every
/// topic and remembers which topics were asked for.
pub struct MockNews {
    articles: Vec<String>,
    topics: Mutex<Vec<String>>,
}

impl MockNews {
    pub fn new(articles: Vec<String>) -> Self {
        Self {
            articles,
            topics: Mutex::new(Vec::new()),
        }
    }

    /// Topics passed to `fetch`, in call order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsSource for MockNews {
    async fn fetch(&self, topic: &str) -> Vec<String> {
        self.topics.lock().unwrap().push(topic.to_string());
        self.articles.clone()
    }
}
