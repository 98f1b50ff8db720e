//! Tools the assistant may ask us to run.
//!
//! The set is closed: every tool is a [`ToolCall`] variant with typed
//! arguments, parsed from the vendor's name + JSON pair and matched
//! exhaustively when executed.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::assistant::{RawToolCall, ToolOutput};
use crate::news::NewsSource;

pub const GET_NEWS: &str = "get_news";

/// Arguments of `get_news`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetNewsArgs {
    pub topic: String,
}

/// A parsed, typed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetNews(GetNewsArgs),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments for {tool}: {source}")]
    Arguments {
        tool: &'static str,
        source: serde_json::Error,
    },
}

impl ToolCall {
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolError> {
        match name {
            GET_NEWS => serde_json::from_str(arguments)
                .map(ToolCall::GetNews)
                .map_err(|source| ToolError::Arguments {
                    tool: GET_NEWS,
                    source,
                }),
            other => Err(ToolError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::GetNews(_) => GET_NEWS,
        }
    }

    /// Declarations for every supported tool, as registered on the assistant.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![ToolDefinition::function(
            GET_NEWS,
            "Get the list of articles/news for the given topic",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "The topic for the news, e.g. bitcoin"
                    }
                },
                "required": ["topic"]
            }),
        )]
    }
}

/// A function tool declaration in the vendor's format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Outcome of a single tool execution. Errors are information, not failures:
/// they are handed back to the model like any other output.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(String),
    Error(String),
}

impl Outcome {
    pub fn into_output(self) -> String {
        match self {
            Outcome::Success(out) => out,
            Outcome::Error(err) => format!("error: {err}"),
        }
    }
}

/// Runs tool calls against the local services they need.
#[derive(Clone)]
pub struct ToolDispatcher {
    news: Arc<dyn NewsSource>,
}

impl ToolDispatcher {
    pub fn new(news: Arc<dyn NewsSource>) -> Self {
        Self { news }
    }

    pub async fn execute(&self, call: &ToolCall) -> Outcome {
        match call {
            ToolCall::GetNews(args) => {
                let articles = self.news.fetch(&args.topic).await;
                if articles.is_empty() {
                    Outcome::Success(format!("No articles found for \"{}\".", args.topic))
                } else {
                    Outcome::Success(articles.join("\n"))
                }
            }
        }
    }

    /// Execute every pending call concurrently and pair each output with its call id.
    pub async fn dispatch(&self, calls: &[RawToolCall]) -> Vec<ToolOutput> {
        let futures = calls.iter().map(|raw| async move {
            let outcome = match ToolCall::parse(&raw.function.name, &raw.function.arguments) {
                Ok(call) => {
                    tracing::info!(tool = call.name(), call_id = %raw.id, "running tool");
                    self.execute(&call).await
                }
                Err(e) => {
                    tracing::warn!(call_id = %raw.id, error = %e, "rejected tool call");
                    Outcome::Error(e.to_string())
                }
            };
            ToolOutput {
                tool_call_id: raw.id.clone(),
                output: outcome.into_output(),
            }
        });

        futures::future::join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::FunctionCall;
    use crate::news::mock::MockNews;

    fn raw(id: &str, name: &str, arguments: &str) -> RawToolCall {
        RawToolCall {
            id: id.to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[test]
    fn parse_get_news() {
        let call = ToolCall::parse("get_news", r#"{"topic": "bitcoin"}"#).unwrap();
        assert_eq!(
            call,
            ToolCall::GetNews(GetNewsArgs {
                topic: "bitcoin".to_string()
            })
        );
        assert_eq!(call.name(), "get_news");
    }

    #[test]
    fn parse_unknown_tool_fails() {
        let err = ToolCall::parse("get_weather", "{}").unwrap_err();
        assert!(matches!(err, ToolError::Unknown(ref n) if n == "get_weather"));
    }

    #[test]
    fn parse_missing_topic_fails() {
        let err = ToolCall::parse("get_news", r#"{"query": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid arguments for get_news"));
    }

    #[test]
    fn parse_malformed_json_fails() {
        assert!(ToolCall::parse("get_news", "{topic: bitcoin").is_err());
    }

    #[test]
    fn definitions_declare_get_news_with_required_topic() {
        let defs = ToolCall::definitions();
        assert_eq!(defs.len(), 1);
        let json = serde_json::to_value(&defs[0]).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_news");
        assert_eq!(json["function"]["parameters"]["required"][0], "topic");
        assert_eq!(
            json["function"]["parameters"]["properties"]["topic"]["type"],
            "string"
        );
    }

    #[test]
    fn error_outcome_is_prefixed() {
        assert_eq!(
            Outcome::Error("boom".to_string()).into_output(),
            "error: boom"
        );
        assert_eq!(Outcome::Success("ok".to_string()).into_output(), "ok");
    }

    #[tokio::test]
    async fn dispatch_joins_articles_with_newline() {
        let news = Arc::new(MockNews::new(vec!["A".to_string(), "B".to_string()]));
        let dispatcher = ToolDispatcher::new(news.clone());

        let outputs = dispatcher
            .dispatch(&[raw("call_1", "get_news", r#"{"topic": "rust"}"#)])
            .await;

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].tool_call_id, "call_1");
        assert_eq!(outputs[0].output, "A\nB");
        assert_eq!(news.topics(), vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_reports_unknown_tool_as_output() {
        let news = Arc::new(MockNews::new(vec![]));
        let dispatcher = ToolDispatcher::new(news.clone());

        let outputs = dispatcher
            .dispatch(&[
                raw("call_1", "delete_everything", "{}"),
                raw("call_2", "get_news", r#"{"topic": "ai"}"#),
            ])
            .await;

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].tool_call_id, "call_1");
        assert!(outputs[0].output.starts_with("error: unknown tool"));
        assert_eq!(outputs[1].output, "No articles found for \"ai\".");
        assert_eq!(news.topics(), vec!["ai".to_string()]);
    }
}
