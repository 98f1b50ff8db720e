use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    AssistantApi, AssistantId, AssistantSpec, Role, Run, RunId, ThreadId, ThreadMessage,
    ToolOutput,
};
use crate::config::AssistantConfig;
use crate::consts::OPENAI_BETA;
use crate::error::{Error, Result};

/// Talks to the OpenAI Assistants v2 REST API.
pub struct OpenAiAssistants {
    client: Client,
    config: AssistantConfig,
}

impl fmt::Debug for OpenAiAssistants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAssistants")
            .field("config", &self.config)
            .finish()
    }
}

impl OpenAiAssistants {
    pub fn new(config: AssistantConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.config.base_url, path))
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Beta", OPENAI_BETA)
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistants {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId> {
        let req = self.request(Method::POST, "assistants").json(spec);
        let created: Created<AssistantId> = Self::send(req).await?;
        tracing::info!(assistant = %created.id, name = %spec.name, "created assistant");
        Ok(created.id)
    }

    async fn create_thread(&self) -> Result<ThreadId> {
        let req = self
            .request(Method::POST, "threads")
            .json(&serde_json::json!({}));
        let created: Created<ThreadId> = Self::send(req).await?;
        tracing::info!(thread = %created.id, "created thread");
        Ok(created.id)
    }

    async fn add_message(&self, thread: &ThreadId, role: Role, content: &str) -> Result<()> {
        let req = self
            .request(Method::POST, &format!("threads/{thread}/messages"))
            .json(&CreateMessage { role, content });
        let _: serde_json::Value = Self::send(req).await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
        instructions: &str,
    ) -> Result<Run> {
        let req = self
            .request(Method::POST, &format!("threads/{thread}/runs"))
            .json(&CreateRun {
                assistant_id: assistant,
                instructions,
            });
        Self::send(req).await
    }

    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run> {
        let req = self.request(Method::GET, &format!("threads/{thread}/runs/{run}"));
        Self::send(req).await
    }

    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let req = self
            .request(
                Method::POST,
                &format!("threads/{thread}/runs/{run}/submit_tool_outputs"),
            )
            .json(&SubmitOutputs {
                tool_outputs: outputs,
            });
        Self::send(req).await
    }

    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> Result<Run> {
        let req = self.request(Method::POST, &format!("threads/{thread}/runs/{run}/cancel"));
        Self::send(req).await
    }

    async fn latest_message(&self, thread: &ThreadId) -> Result<Option<ThreadMessage>> {
        let req = self.request(
            Method::GET,
            &format!("threads/{thread}/messages?order=desc&limit=1"),
        );
        let list: MessageList = Self::send(req).await?;
        Ok(list.data.into_iter().next().and_then(ApiMessage::into_text))
    }
}

// --- API types ---

#[derive(Deserialize)]
struct Created<T> {
    id: T,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRun<'a> {
    assistant_id: &'a AssistantId,
    instructions: &'a str,
}

#[derive(Serialize)]
struct SubmitOutputs<'a> {
    tool_outputs: &'a [ToolOutput],
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ApiMessage>,
}

#[derive(Deserialize)]
struct ApiMessage {
    role: Role,
    content: Vec<ContentPart>,
}

impl ApiMessage {
    /// Keep the first text part; image parts carry no summary.
    fn into_text(self) -> Option<ThreadMessage> {
        let role = self.role;
        self.content
            .into_iter()
            .find_map(|part| match part.kind.as_str() {
                "text" => part.text.map(|t| t.value),
                _ => None,
            })
            .map(|text| ThreadMessage { role, text })
    }
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextContent>,
}

#[derive(Deserialize)]
struct TextContent {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_run_body_shape() {
        let assistant = AssistantId::new("asst_1");
        let body = serde_json::to_value(CreateRun {
            assistant_id: &assistant,
            instructions: "Summarize the news",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"assistant_id": "asst_1", "instructions": "Summarize the news"})
        );
    }

    #[test]
    fn submit_outputs_body_shape() {
        let outputs = vec![ToolOutput {
            tool_call_id: "call_1".to_string(),
            output: "Title: A".to_string(),
        }];
        let body = serde_json::to_value(SubmitOutputs {
            tool_outputs: &outputs,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"tool_outputs": [{"tool_call_id": "call_1", "output": "Title: A"}]})
        );
    }

    #[test]
    fn message_list_takes_first_text_part() {
        let json = r#"{
            "object": "list",
            "data": [{
                "id": "msg_1",
                "role": "assistant",
                "content": [
                    {"type": "image_file", "image_file": {"file_id": "f"}},
                    {"type": "text", "text": {"value": "Bitcoin rallied.", "annotations": []}}
                ]
            }]
        }"#;
        let list: MessageList = serde_json::from_str(json).unwrap();
        let message = list.data.into_iter().next().unwrap().into_text().unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text, "Bitcoin rallied.");
    }

    #[test]
    fn message_without_text_yields_none() {
        let json = r#"{"role": "assistant", "content": []}"#;
        let message: ApiMessage = serde_json::from_str(json).unwrap();
        assert!(message.into_text().is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = OpenAiAssistants::new(AssistantConfig::new("sk-hidden")).unwrap();
        assert!(!format!("{:?}", client).contains("sk-hidden"));
    }
}
