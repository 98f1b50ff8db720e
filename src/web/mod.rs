use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub mod handlers;
pub mod page;

use crate::jobs::JobRegistry;

pub struct AppState {
    pub jobs: Arc<JobRegistry>,
    /// Seconds between automatic reloads of a running job's page.
    pub refresh_secs: u64,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route("/jobs/{id}", get(handlers::job))
        .route("/jobs/{id}/cancel", post(handlers::cancel))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
}
