use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppState, page};
use crate::jobs::JobId;

#[derive(Debug, Deserialize)]
pub struct TopicForm {
    #[serde(default)]
    pub topic: String,
}

pub async fn index() -> Html<String> {
    Html(page::form_page("", None))
}

pub async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<TopicForm>) -> Response {
    let topic = form.topic.trim();
    if topic.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(page::form_page("", Some("Enter a topic to summarize."))),
        )
            .into_response();
    }

    let id = state.jobs.start(topic).await;
    Redirect::to(&format!("/jobs/{id}")).into_response()
}

pub async fn job(State(state): State<Arc<AppState>>, Path(id): Path<JobId>) -> Response {
    match state.jobs.get(id).await {
        Some(snapshot) => Html(page::job_page(&snapshot, state.refresh_secs)).into_response(),
        None => (StatusCode::NOT_FOUND, Html(page::not_found_page())).into_response(),
    }
}

pub async fn cancel(State(state): State<Arc<AppState>>, Path(id): Path<JobId>) -> Redirect {
    if !state.jobs.cancel(id).await {
        tracing::debug!(job = id, "cancel ignored: job unknown or finished");
    }
    Redirect::to(&format!("/jobs/{id}"))
}

pub async fn health() -> &'static str {
    "ok"
}
