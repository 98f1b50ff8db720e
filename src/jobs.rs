//! Background summary jobs.
//!
//! Each submission runs the [`Engine`] on its own tokio task so the web
//! request that started it returns immediately. The registry tracks the
//! latest run status, the outcome, and a cancel handle per job.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

use crate::assistant::RunStatus;
use crate::engine::Engine;
use crate::error::Error;
use crate::events::{Event, EventBus};
use crate::session::{CancelHandle, RunControl, Summary};

/// Finished jobs kept around for their result pages.
const RETAINED_FINISHED: usize = 256;

pub type JobId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    /// Still working; `status` is the last run status seen, if any.
    Running { status: Option<RunStatus> },
    Done(Summary),
    Failed(String),
    Cancelled,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Running { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Running { .. } => "running",
            JobState::Done(_) => "done",
            JobState::Failed(_) => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub topic: String,
    pub state: JobState,
    pub elapsed: Duration,
}

struct JobEntry {
    topic: String,
    state: JobState,
    started: Instant,
    finished: Option<Instant>,
    cancel: CancelHandle,
}

type Jobs = Arc<RwLock<HashMap<JobId, JobEntry>>>;

pub struct JobRegistry {
    engine: Arc<dyn Engine>,
    jobs: Jobs,
    next_id: AtomicU64,
}

impl JobRegistry {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Spawn a summary job for `topic` and return its id right away.
    pub async fn start(&self, topic: &str) -> JobId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let events = EventBus::default();
        let (cancel, control) = RunControl::new(events.clone());
        let progress = events.subscribe();
        drop(events);

        {
            let mut jobs = self.jobs.write().await;
            prune(&mut jobs);
            jobs.insert(
                id,
                JobEntry {
                    topic: topic.to_string(),
                    state: JobState::Running { status: None },
                    started: Instant::now(),
                    finished: None,
                    cancel,
                },
            );
        }

        tokio::spawn(track_progress(id, progress, Arc::clone(&self.jobs)));

        let engine = Arc::clone(&self.engine);
        let jobs = Arc::clone(&self.jobs);
        let topic = topic.to_string();
        tokio::spawn(async move {
            tracing::info!(job = id, topic = %topic, "job started");
            let state = match engine.summarize(&topic, &control).await {
                Ok(summary) => JobState::Done(summary),
                Err(Error::Cancelled) => JobState::Cancelled,
                Err(e) => JobState::Failed(e.to_string()),
            };
            drop(control);

            tracing::info!(job = id, outcome = state.label(), "job ended");
            if let Some(entry) = jobs.write().await.get_mut(&id) {
                entry.state = state;
                entry.finished = Some(Instant::now());
            }
        });

        id
    }

    pub async fn get(&self, id: JobId) -> Option<JobSnapshot> {
        let jobs = self.jobs.read().await;
        jobs.get(&id).map(|entry| JobSnapshot {
            id,
            topic: entry.topic.clone(),
            state: entry.state.clone(),
            elapsed: entry.finished.unwrap_or_else(Instant::now) - entry.started,
        })
    }

    /// Ask a running job to stop. Returns false for unknown or finished jobs.
    pub async fn cancel(&self, id: JobId) -> bool {
        let jobs = self.jobs.read().await;
        match jobs.get(&id) {
            Some(entry) if !entry.state.is_finished() => {
                entry.cancel.cancel();
                tracing::info!(job = id, "job cancel requested");
                true
            }
            _ => false,
        }
    }
}

async fn track_progress(id: JobId, mut rx: tokio::sync::broadcast::Receiver<Event>, jobs: Jobs) {
    loop {
        match rx.recv().await {
            Ok(Event::Status { status }) => {
                if let Some(entry) = jobs.write().await.get_mut(&id)
                    && !entry.state.is_finished()
                {
                    entry.state = JobState::Running {
                        status: Some(status),
                    };
                }
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
}

/// Drop the oldest finished jobs beyond the retention limit.
fn prune(jobs: &mut HashMap<JobId, JobEntry>) {
    let mut finished: Vec<(JobId, Instant)> = jobs
        .iter()
        .filter_map(|(id, entry)| entry.finished.map(|at| (*id, at)))
        .collect();

    if finished.len() < RETAINED_FINISHED {
        return;
    }

    finished.sort_by_key(|(_, at)| *at);
    let excess = finished.len() + 1 - RETAINED_FINISHED;
    for (id, _) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(finished: Option<Instant>) -> JobEntry {
        let (cancel, _control) = RunControl::new(EventBus::default());
        JobEntry {
            topic: "bitcoin".to_string(),
            state: JobState::Cancelled,
            started: Instant::now(),
            finished,
            cancel,
        }
    }

    #[test]
    fn labels() {
        assert_eq!(JobState::Running { status: None }.label(), "running");
        assert_eq!(JobState::Failed("boom".to_string()).label(), "failed");
        assert!(!JobState::Running { status: None }.is_finished());
        assert!(JobState::Cancelled.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_oldest_finished_and_keeps_running() {
        let mut jobs = HashMap::new();
        jobs.insert(0, entry(None));
        for id in 1..=RETAINED_FINISHED as JobId {
            tokio::time::advance(Duration::from_millis(1)).await;
            jobs.insert(id, entry(Some(Instant::now())));
        }

        prune(&mut jobs);

        assert_eq!(jobs.len(), RETAINED_FINISHED);
        assert!(jobs.contains_key(&0));
        assert!(!jobs.contains_key(&1));
        assert!(jobs.contains_key(&2));
    }

    #[test]
    fn prune_below_limit_is_a_no_op() {
        let mut jobs = HashMap::new();
        jobs.insert(1, entry(Some(Instant::now())));
        prune(&mut jobs);
        assert_eq!(jobs.len(), 1);
    }
}
