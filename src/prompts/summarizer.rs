use crate::assistant::AssistantSpec;
use crate::tools::ToolCall;

pub const ASSISTANT_NAME: &str = "News Summarizer";
pub const ASSISTANT_INSTRUCTIONS: &str = "You are a personal article summarizer assistant.";
pub const RUN_INSTRUCTIONS: &str = "Summarize the news";

/// The assistant definition registered once per process.
pub fn assistant_spec(model: &str) -> AssistantSpec {
    AssistantSpec {
        name: ASSISTANT_NAME.to_string(),
        instructions: ASSISTANT_INSTRUCTIONS.to_string(),
        model: model.to_string(),
        tools: ToolCall::definitions(),
    }
}

/// The user message that kicks off a summary for `topic`.
pub fn user_message(topic: &str) -> String {
    format!("Summarize the news on this topic: {topic}?")
}
