use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::Engine;
use crate::assistant::{AssistantApi, AssistantId, AssistantSpec, Role};
use crate::config::PollConfig;
use crate::error::Result;
use crate::prompts::summarizer::{RUN_INSTRUCTIONS, user_message};
use crate::session::{RunControl, Session, Summary};
use crate::tools::ToolDispatcher;

/// Drives one [`Session`] per topic. The remote assistant definition is
/// created on first use and shared by every later submission; each
/// submission gets its own thread.
pub struct AssistantEngine {
    api: Arc<dyn AssistantApi>,
    tools: ToolDispatcher,
    poll: PollConfig,
    spec: AssistantSpec,
    assistant: OnceCell<AssistantId>,
}

impl AssistantEngine {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        tools: ToolDispatcher,
        poll: PollConfig,
        spec: AssistantSpec,
    ) -> Self {
        Self {
            api,
            tools,
            poll,
            spec,
            assistant: OnceCell::new(),
        }
    }

    /// The shared assistant id, once the first submission has created it.
    pub fn assistant_id(&self) -> Option<&AssistantId> {
        self.assistant.get()
    }

    async fn shared_assistant(&self) -> Result<AssistantId> {
        let id = self
            .assistant
            .get_or_try_init(|| async {
                let mut session =
                    Session::new(Arc::clone(&self.api), self.tools.clone(), self.poll);
                session.create_assistant(&self.spec).await
            })
            .await?;
        Ok(id.clone())
    }
}

#[async_trait]
impl Engine for AssistantEngine {
    async fn summarize(&self, topic: &str, control: &RunControl) -> Result<Summary> {
        let assistant = self.shared_assistant().await?;
        let mut session = Session::resume(
            Arc::clone(&self.api),
            self.tools.clone(),
            self.poll,
            assistant,
        );

        session.create_thread().await?;
        session.add_message(Role::User, &user_message(topic)).await?;
        session.start_run(RUN_INSTRUCTIONS).await?;
        session.poll_until_done(control).await
    }
}
