//! Event submission endpoint

use axum::{Form, Router, extract::State, response::Html, routing::get};
use calzone_core::EventSubmission;

use crate::routes::{AppError, response_html};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api", get(submit_event).post(submit_event))
}

/// GET|POST /api - Append an event to its month's ledger
async fn submit_event(
    State(state): State<AppState>,
    Form(submission): Form<EventSubmission>,
) -> Result<Html<String>, AppError> {
    state.run(move |calzone| calzone.submit_event(&submission)).await?;

    Ok(Html(response_html("Calendar event added", false)))
}
