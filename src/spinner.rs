//! A terminal spinner that shows the live run status while a summary is polled.

use std::io::Write;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::{Event, EventBus};

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

/// Short label for the spinner line, or `None` if the event changes nothing.
fn describe(event: &Event) -> Option<String> {
    match event {
        Event::Status { status } => Some(status.to_string()),
        Event::ToolsRequested { tools } => Some(format!("running {}", tools.join(", "))),
        Event::ToolOutputsSubmitted { count } => Some(format!("submitted {count} tool output(s)")),
    }
}

/// Runs in a background task and writes to stderr so stdout stays clean.
pub struct Spinner {
    handle: JoinHandle<()>,
    cancel: tokio::sync::watch::Sender<bool>,
}

impl Spinner {
    /// Start spinning with `message`, appending the latest event from `events`.
    pub fn start(message: &str, events: &EventBus) -> Self {
        let (cancel_tx, mut cancel_rx) = tokio::sync::watch::channel(false);
        let mut rx = events.subscribe();
        let message = message.to_string();

        let handle = tokio::spawn(async move {
            let mut i = 0;
            let mut label = "starting".to_string();
            let mut events_open = true;
            loop {
                let frame = FRAMES[i % FRAMES.len()];
                // \r moves to start of line, \x1b[2K clears the line
                eprint!("\x1b[2K\r{frame} {message} [{label}]");
                let _ = std::io::stderr().flush();

                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {}
                    _ = cancel_rx.changed() => break,
                    event = rx.recv(), if events_open => match event {
                        Ok(event) => {
                            if let Some(l) = describe(&event) {
                                label = l;
                            }
                        }
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => events_open = false,
                    },
                }
                i += 1;
            }
            eprint!("\x1b[2K\r");
            let _ = std::io::stderr().flush();
        });

        Self {
            handle,
            cancel: cancel_tx,
        }
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.handle.await;
    }
}
