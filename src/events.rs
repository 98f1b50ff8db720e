//! Progress events emitted while a run is being polled.
//!
//! The session emits via [`EventBus::emit`]; the CLI spinner and the job
//! registry subscribe via [`EventBus::subscribe`]. Built on
//! [`tokio::sync::broadcast`] so multiple listeners can react independently.

use tokio::sync::broadcast;

use crate::assistant::RunStatus;

/// Events that flow out of a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A poll observed the run in this status.
    Status { status: RunStatus },
    /// The run asked for tool output; carries the tool names requested.
    ToolsRequested { tools: Vec<String> },
    /// A batch of tool outputs went back to the run.
    ToolOutputsSubmitted { count: usize },
}

/// A broadcast channel any component can emit to or subscribe from.
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    /// Returns the number of receivers that will see it.
    pub fn emit(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to future events (past ones are not replayed).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
