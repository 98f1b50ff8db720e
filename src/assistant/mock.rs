use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    AssistantApi, AssistantId, AssistantSpec, Role, Run, RunId, RunStatus, ThreadId,
    ThreadMessage, ToolOutput,
};
use crate::error::Result;

/// A scripted assistant service for tests.
///
/// `retrieve_run` returns the scripted snapshots in order and then keeps
/// returning the last one, so a script ending in `in_progress` never finishes.
pub struct MockAssistant {
    script: Vec<Run>,
    polls: AtomicUsize,
    reply: Option<ThreadMessage>,
    assistants: AtomicUsize,
    threads: AtomicUsize,
    cancels: AtomicUsize,
    messages: Mutex<Vec<(Role, String)>>,
    submissions: Mutex<Vec<Vec<ToolOutput>>>,
    specs: Mutex<Vec<AssistantSpec>>,
}

impl MockAssistant {
    pub fn new(script: Vec<Run>) -> Self {
        Self {
            script,
            polls: AtomicUsize::new(0),
            reply: None,
            assistants: AtomicUsize::new(0),
            threads: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            specs: Mutex::new(Vec::new()),
        }
    }

    /// The assistant message returned by `latest_message`.
    pub fn with_reply(mut self, text: &str) -> Self {
        self.reply = Some(ThreadMessage {
            role: Role::Assistant,
            text: text.to_string(),
        });
        self
    }

    pub fn assistants_created(&self) -> usize {
        self.assistants.load(Ordering::SeqCst)
    }

    pub fn threads_created(&self) -> usize {
        self.threads.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<(Role, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Every batch passed to `submit_tool_outputs`, in order.
    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn specs(&self) -> Vec<AssistantSpec> {
        self.specs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantApi for MockAssistant {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId> {
        let n = self.assistants.fetch_add(1, Ordering::SeqCst);
        self.specs.lock().unwrap().push(spec.clone());
        Ok(AssistantId::new(format!("asst_mock_{}", n + 1)))
    }

    async fn create_thread(&self) -> Result<ThreadId> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst);
        Ok(ThreadId::new(format!("thread_mock_{}", n + 1)))
    }

    async fn add_message(&self, _thread: &ThreadId, role: Role, content: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((role, content.to_string()));
        Ok(())
    }

    async fn create_run(
        &self,
        _thread: &ThreadId,
        _assistant: &AssistantId,
        _instructions: &str,
    ) -> Result<Run> {
        Ok(Run::new(self.run_id(), RunStatus::Queued))
    }

    async fn retrieve_run(&self, _thread: &ThreadId, _run: &RunId) -> Result<Run> {
        let i = self.polls.fetch_add(1, Ordering::SeqCst);
        let run = self
            .script
            .get(i)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| Run::new(self.run_id(), RunStatus::InProgress));
        Ok(run)
    }

    async fn submit_tool_outputs(
        &self,
        _thread: &ThreadId,
        run: &RunId,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        self.submissions.lock().unwrap().push(outputs.to_vec());
        Ok(Run::new(run.as_str(), RunStatus::Queued))
    }

    async fn cancel_run(&self, _thread: &ThreadId, run: &RunId) -> Result<Run> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(Run::new(run.as_str(), RunStatus::Cancelling))
    }

    async fn latest_message(&self, _thread: &ThreadId) -> Result<Option<ThreadMessage>> {
        Ok(self.reply.clone())
    }
}

impl MockAssistant {
    fn run_id(&self) -> String {
        self.script
            .first()
            .map(|r| r.id.as_str().to_string())
            .unwrap_or_else(|| "run_mock".to_string())
    }
}
