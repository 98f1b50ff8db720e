//! Server-rendered HTML for the single-page form.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use url::Url;

use crate::consts::format_number;
use crate::jobs::{JobSnapshot, JobState};

const TITLE: &str = "News Summarizer";

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:46rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
input[type=text]{width:70%;padding:.4rem}button{padding:.4rem .8rem}\
.status{color:#555}.error{color:#b00020}.notice{color:#8a6d00}\
.summary{border-top:1px solid #ddd;margin-top:1.5rem;padding-top:1rem}.usage{color:#777;font-size:.85rem}";

/// Escape text for use in HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Links and images may only point at web or mail URLs. Relative ones are fine.
fn is_safe_url(dest: &str) -> bool {
    match Url::parse(dest) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "mailto"),
        Err(url::ParseError::RelativeUrlWithoutBase) => true,
        Err(_) => false,
    }
}

/// Render model output as markdown. Raw HTML in the input is shown as text
/// and links with any other scheme lose their target.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed(""),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn layout(refresh: Option<u64>, content: &str) -> String {
    let refresh = refresh
        .map(|secs| format!("<meta http-equiv=\"refresh\" content=\"{secs}\">\n"))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n{refresh}<title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{TITLE}</h1>\n{content}</body>\n</html>\n"
    )
}

fn topic_form(topic: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/\">\n<label for=\"topic\">Enter topic</label><br>\n<input type=\"text\" id=\"topic\" name=\"topic\" value=\"{}\" autofocus>\n<button type=\"submit\">Run Assistant</button>\n</form>\n",
        escape(topic)
    )
}

/// The bare form, optionally with a notice above it.
pub fn form_page(topic: &str, notice: Option<&str>) -> String {
    let notice = notice
        .map(|n| format!("<p class=\"notice\">{}</p>\n", escape(n)))
        .unwrap_or_default();
    layout(None, &format!("{notice}{}", topic_form(topic)))
}

/// The form plus the state of one job. Running jobs refresh themselves.
pub fn job_page(job: &JobSnapshot, refresh_secs: u64) -> String {
    let elapsed = job.elapsed.as_secs();
    let topic = escape(&job.topic);

    let (refresh, body) = match &job.state {
        JobState::Running { status } => {
            let status = status.map(|s| s.to_string()).unwrap_or_else(|| "starting".to_string());
            (
                Some(refresh_secs),
                format!(
                    "<p class=\"status\">Summarizing news on \"{topic}\": {status} ({elapsed}s)</p>\n<form method=\"post\" action=\"/jobs/{}/cancel\"><button type=\"submit\">Cancel</button></form>\n",
                    job.id
                ),
            )
        }
        JobState::Done(summary) => {
            let usage = summary
                .usage
                .map(|u| {
                    format!(
                        "<p class=\"usage\">{} prompt + {} completion tokens, {elapsed}s</p>\n",
                        format_number(u.prompt_tokens),
                        format_number(u.completion_tokens)
                    )
                })
                .unwrap_or_default();
            (
                None,
                format!(
                    "<section class=\"summary\">\n{}</section>\n{usage}",
                    markdown_to_html(&summary.text)
                ),
            )
        }
        JobState::Failed(reason) => (
            None,
            format!(
                "<p class=\"error\">Could not summarize \"{topic}\": {}</p>\n",
                escape(reason)
            ),
        ),
        JobState::Cancelled => (
            None,
            format!("<p class=\"notice\">Cancelled after {elapsed}s.</p>\n"),
        ),
    };

    layout(refresh, &format!("{}{body}", topic_form(&job.topic)))
}

pub fn not_found_page() -> String {
    layout(
        None,
        &format!(
            "<p class=\"error\">No such job.</p>\n{}",
            topic_form("")
        ),
    )
}
