//! The assistant session manager.
//!
//! A [`Session`] owns one assistant, one thread and one run at a time and
//! walks them through an explicit [`SessionState`] machine:
//!
//! ```text
//! Idle -> AssistantCreated -> ThreadCreated -> MessageAdded -> Running -> Completed
//!                                                                     \-> Failed
//! ```
//!
//! Operations called from the wrong state return [`Error::NotReady`]
//! instead of silently doing nothing.

use std::future::pending;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::assistant::{
    AssistantApi, AssistantId, AssistantSpec, Role, RunId, RunStatus, ThreadId, TokenUsage,
};
use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::events::{Event, EventBus};
use crate::tools::ToolDispatcher;

/// The final assistant-authored message of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub role: Role,
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    AssistantCreated {
        assistant: AssistantId,
    },
    ThreadCreated {
        assistant: AssistantId,
        thread: ThreadId,
    },
    MessageAdded {
        assistant: AssistantId,
        thread: ThreadId,
    },
    Running {
        assistant: AssistantId,
        thread: ThreadId,
        run: RunId,
    },
    Completed {
        assistant: AssistantId,
        thread: ThreadId,
    },
    Failed {
        assistant: AssistantId,
        thread: ThreadId,
        reason: String,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AssistantCreated { .. } => "assistant-created",
            SessionState::ThreadCreated { .. } => "thread-created",
            SessionState::MessageAdded { .. } => "message-added",
            SessionState::Running { .. } => "running",
            SessionState::Completed { .. } => "completed",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn assistant(&self) -> Option<&AssistantId> {
        match self {
            SessionState::Idle => None,
            SessionState::AssistantCreated { assistant }
            | SessionState::ThreadCreated { assistant, .. }
            | SessionState::MessageAdded { assistant, .. }
            | SessionState::Running { assistant, .. }
            | SessionState::Completed { assistant, .. }
            | SessionState::Failed { assistant, .. } => Some(assistant),
        }
    }

    pub fn thread(&self) -> Option<&ThreadId> {
        match self {
            SessionState::Idle | SessionState::AssistantCreated { .. } => None,
            SessionState::ThreadCreated { thread, .. }
            | SessionState::MessageAdded { thread, .. }
            | SessionState::Running { thread, .. }
            | SessionState::Completed { thread, .. }
            | SessionState::Failed { thread, .. } => Some(thread),
        }
    }
}

/// Lets the owner of a run cancel it from another task.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// What a poll loop listens to (cancellation) and reports through (events).
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: watch::Receiver<bool>,
    events: EventBus,
}

impl RunControl {
    /// A control wired to a fresh cancel handle.
    pub fn new(events: EventBus) -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx: Arc::new(tx) },
            Self { cancel: rx, events },
        )
    }

    /// A control that can never be cancelled and whose events nobody reads.
    pub fn detached() -> Self {
        let (_handle, control) = Self::new(EventBus::default());
        control
    }

}

/// Resolves once the flag is set. If every handle is gone it never resolves.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            pending::<()>().await;
        }
    }
}

pub struct Session {
    api: Arc<dyn AssistantApi>,
    tools: ToolDispatcher,
    poll: PollConfig,
    state: SessionState,
    summary: Option<Summary>,
}

impl Session {
    pub fn new(api: Arc<dyn AssistantApi>, tools: ToolDispatcher, poll: PollConfig) -> Self {
        Self {
            api,
            tools,
            poll,
            state: SessionState::Idle,
            summary: None,
        }
    }

    /// Start from an assistant that already exists remotely.
    pub fn resume(
        api: Arc<dyn AssistantApi>,
        tools: ToolDispatcher,
        poll: PollConfig,
        assistant: AssistantId,
    ) -> Self {
        Self {
            api,
            tools,
            poll,
            state: SessionState::AssistantCreated { assistant },
            summary: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The last recorded summary, if a run ever completed.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    /// Register the remote assistant. A no-op once one exists.
    pub async fn create_assistant(&mut self, spec: &AssistantSpec) -> Result<AssistantId> {
        if let Some(existing) = self.state.assistant() {
            return Ok(existing.clone());
        }

        let assistant = self.api.create_assistant(spec).await?;
        self.state = SessionState::AssistantCreated {
            assistant: assistant.clone(),
        };
        Ok(assistant)
    }

    /// Create the conversation thread. A no-op once one exists.
    pub async fn create_thread(&mut self) -> Result<ThreadId> {
        if let Some(existing) = self.state.thread() {
            return Ok(existing.clone());
        }

        let assistant = match &self.state {
            SessionState::AssistantCreated { assistant } => assistant.clone(),
            other => return Err(not_ready("create a thread", other)),
        };

        let thread = self.api.create_thread().await?;
        self.state = SessionState::ThreadCreated {
            assistant,
            thread: thread.clone(),
        };
        Ok(thread)
    }

    /// Append a message to the thread. Allowed whenever no run is active.
    pub async fn add_message(&mut self, role: Role, content: &str) -> Result<()> {
        let (assistant, thread) = match &self.state {
            SessionState::ThreadCreated { assistant, thread }
            | SessionState::MessageAdded { assistant, thread }
            | SessionState::Completed {
                assistant, thread, ..
            }
            | SessionState::Failed {
                assistant, thread, ..
            } => (assistant.clone(), thread.clone()),
            other => return Err(not_ready("add a message", other)),
        };

        self.api.add_message(&thread, role, content).await?;
        tracing::debug!(thread = %thread, %role, "added message");
        self.state = SessionState::MessageAdded { assistant, thread };
        Ok(())
    }

    /// Start the assistant on the thread. Needs at least one new message.
    pub async fn start_run(&mut self, instructions: &str) -> Result<RunId> {
        let (assistant, thread) = match &self.state {
            SessionState::MessageAdded { assistant, thread } => {
                (assistant.clone(), thread.clone())
            }
            other => return Err(not_ready("start a run", other)),
        };

        let run = self.api.create_run(&thread, &assistant, instructions).await?;
        tracing::info!(thread = %thread, run = %run.id, status = %run.status, "started run");
        self.state = SessionState::Running {
            assistant,
            thread,
            run: run.id.clone(),
        };
        Ok(run.id)
    }

    /// Poll the active run until it completes, fails, times out, or is cancelled.
    pub async fn poll_until_done(&mut self, control: &RunControl) -> Result<Summary> {
        let (assistant, thread, run) = match &self.state {
            SessionState::Running {
                assistant,
                thread,
                run,
            } => (assistant.clone(), thread.clone(), run.clone()),
            other => return Err(not_ready("poll a run", other)),
        };

        match self.poll_loop(&thread, &run, control).await {
            Ok(summary) => {
                self.state = SessionState::Completed { assistant, thread };
                self.summary = Some(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(run = %run, error = %e, "run did not complete");
                self.state = SessionState::Failed {
                    assistant,
                    thread,
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    async fn poll_loop(
        &self,
        thread: &ThreadId,
        run: &RunId,
        control: &RunControl,
    ) -> Result<Summary> {
        let mut cancel = control.cancel.clone();
        // A timeout too large to represent means no deadline
        let deadline = Instant::now().checked_add(self.poll.timeout);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll.interval) => {}
                _ = cancelled(&mut cancel) => {
                    self.abort(thread, run).await;
                    return Err(Error::Cancelled);
                }
            }

            if deadline.is_some_and(|at| Instant::now() >= at) {
                self.abort(thread, run).await;
                return Err(Error::TimedOut(self.poll.timeout));
            }

            let snapshot = self.api.retrieve_run(thread, run).await?;
            tracing::debug!(run = %run, status = %snapshot.status, "polled run");
            control.events.emit(Event::Status {
                status: snapshot.status,
            });

            match snapshot.status {
                RunStatus::Completed => {
                    return self.collect_summary(thread, snapshot.usage).await;
                }
                RunStatus::RequiresAction => {
                    let calls = snapshot.pending_tool_calls();
                    if calls.is_empty() {
                        tracing::warn!(run = %run, "run requires action but lists no tool calls");
                        continue;
                    }

                    control.events.emit(Event::ToolsRequested {
                        tools: calls.iter().map(|c| c.function.name.clone()).collect(),
                    });

                    let outputs = self.tools.dispatch(calls).await;
                    self.api.submit_tool_outputs(thread, run, &outputs).await?;
                    tracing::info!(run = %run, count = outputs.len(), "submitted tool outputs");
                    control.events.emit(Event::ToolOutputsSubmitted {
                        count: outputs.len(),
                    });
                }
                status if status.is_failure() => {
                    return Err(Error::RunEnded {
                        status,
                        reason: snapshot.failure_reason(),
                    });
                }
                // queued, in_progress, cancelling
                _ => {}
            }
        }
    }

    async fn collect_summary(
        &self,
        thread: &ThreadId,
        usage: Option<TokenUsage>,
    ) -> Result<Summary> {
        let message = self
            .api
            .latest_message(thread)
            .await?
            .ok_or(Error::NoSummary)?;

        tracing::info!(
            thread = %thread,
            role = %message.role,
            chars = message.text.len(),
            "summary ready"
        );
        Ok(Summary {
            role: message.role,
            text: message.text,
            usage,
        })
    }

    /// Best effort: the run is abandoned locally either way.
    async fn abort(&self, thread: &ThreadId, run: &RunId) {
        if let Err(e) = self.api.cancel_run(thread, run).await {
            tracing::warn!(run = %run, error = %e, "failed to cancel remote run");
        }
    }
}

fn not_ready(op: &'static str, state: &SessionState) -> Error {
    Error::NotReady {
        op,
        state: state.name(),
    }
}
