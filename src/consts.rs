//! Project-wide constants.

use std::time::Duration;

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Default OpenAI model backing the assistant.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Base URL of the OpenAI REST API (without trailing slash).
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Beta header value required by the Assistants endpoints.
pub const OPENAI_BETA: &str = "assistants=v2";

/// Base URL of the news search API (without trailing slash).
pub const NEWS_API_URL: &str = "https://newsapi.org";

/// Maximum number of articles requested per topic.
pub const NEWS_PAGE_SIZE: usize = 5;

/// Delay between two run status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound on how long a single run may take before it is cancelled.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Per-request HTTP timeout for both vendor APIs.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default listen address for the web UI.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
