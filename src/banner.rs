//! Startup banner and one-shot result display.

use std::time::Duration;

use crate::consts::{AUTHOR, HOMEPAGE, REPO, format_number};
use crate::session::Summary;

/// Server configuration shown at startup.
pub struct BannerInfo<'a> {
    pub model: &'a str,
    pub listen: &'a str,
    pub news_url: &'a str,
    pub openai_url: &'a str,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
}

/// Print the startup banner with server info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║            N E W S U M                ║
   ║     the news, read for you            ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   model     {}
   news      {}
   openai    {}
   polling   every {}s, give up after {}s
   listening http://{}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.model,
        info.news_url,
        info.openai_url,
        info.poll_interval.as_secs(),
        info.run_timeout.as_secs(),
        info.listen,
    );
}

/// Print a finished summary the way the one-shot CLI shows it.
pub fn print_summary(topic: &str, summary: &Summary) {
    println!("\n=> {} on \"{}\":\n", capitalize(&summary.role.to_string()), topic);
    println!("{}", summary.text);
    if let Some(usage) = summary.usage {
        println!(
            "\nrun: {:>6} prompt + {:>6} completion = {:>6} tokens",
            format_number(usage.prompt_tokens),
            format_number(usage.completion_tokens),
            format_number(usage.total()),
        );
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{Role, TokenUsage};

    #[test]
    fn capitalize_words() {
        assert_eq!(capitalize("assistant"), "Assistant");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn print_banner_does_not_panic() {
        print_banner(&BannerInfo {
            model: "gpt-4",
            listen: "127.0.0.1:8501",
            news_url: "https://newsapi.org",
            openai_url: "https://api.openai.com/v1",
            poll_interval: Duration::from_secs(2),
            run_timeout: Duration::from_secs(300),
        });
    }

    #[test]
    fn print_summary_with_usage() {
        print_summary(
            "bitcoin",
            &Summary {
                role: Role::Assistant,
                text: "Prices are up.".to_string(),
                usage: Some(TokenUsage {
                    prompt_tokens: 1500,
                    completion_tokens: 200,
                }),
            },
        );
    }
}
