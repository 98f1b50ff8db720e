//! The remote assistant: typed identifiers, run state, and the
//! [`AssistantApi`] trait the session manager drives.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::tools::ToolDefinition;

pub use openai::OpenAiAssistants;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(
    /// Identifier of a remote assistant definition (`asst_...`).
    AssistantId
);
remote_id!(
    /// Identifier of a remote conversation thread (`thread_...`).
    ThreadId
);
remote_id!(
    /// Identifier of one run of an assistant on a thread (`run_...`).
    RunId
);

/// Who authored a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// Remote run status, in the vendor's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }

    /// Terminal statuses that did not produce an answer.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Incomplete | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage reported on a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A snapshot of a run as returned by the vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    #[serde(default)]
    pub last_error: Option<LastError>,
    #[serde(default)]
    pub incomplete_details: Option<IncompleteDetails>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl Run {
    /// Build a run snapshot with nothing but an id and a status.
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: RunId::new(id),
            status,
            required_action: None,
            last_error: None,
            incomplete_details: None,
            usage: None,
        }
    }

    /// Tool calls the run is waiting on; empty unless status is `requires_action`.
    pub fn pending_tool_calls(&self) -> &[RawToolCall] {
        self.required_action
            .as_ref()
            .map(|a| a.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or(&[])
    }

    /// Human readable reason for a failed run, if the vendor gave one.
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(err) = &self.last_error {
            return Some(format!("{} ({})", err.message, err.code));
        }
        self.incomplete_details.as_ref().map(|d| d.reason.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitToolOutputs {
    pub tool_calls: Vec<RawToolCall>,
}

/// A tool call as the vendor sends it: name plus JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteDetails {
    pub reason: String,
}

/// The result of one tool call, sent back to the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// The latest text message on a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    pub role: Role,
    pub text: String,
}

/// Everything needed to register a remote assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<ToolDefinition>,
}

/// The remote assistant service. One implementation talks HTTP, the mock
/// replays a script.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId>;

    async fn create_thread(&self) -> Result<ThreadId>;

    async fn add_message(&self, thread: &ThreadId, role: Role, content: &str) -> Result<()>;

    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
        instructions: &str,
    ) -> Result<Run>;

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run>;

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run>;

    /// Most recent message on the thread, or `None` if it has no text message.
    async fn latest_message(&self, thread: &ThreadId) -> Result<Option<ThreadMessage>>;
}
