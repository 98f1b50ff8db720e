use std::time::Duration;

use thiserror::Error;

use crate::assistant::RunStatus;

/// Everything that can go wrong while driving an assistant run.
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was called before the session reached the state it needs.
    #[error("cannot {op} while the session is {state}")]
    NotReady { op: &'static str, state: &'static str },

    /// The run reached a terminal status other than `completed`.
    #[error("run ended with status {status}{}", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    RunEnded {
        status: RunStatus,
        reason: Option<String>,
    },

    #[error("run did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("run was cancelled")]
    Cancelled,

    #[error("assistant API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completed run left no assistant message in the thread")]
    NoSummary,
}

pub type Result<T> = std::result::Result<T, Error>;
