//! Calendar view endpoints

use axum::{Json, Router, extract::State, response::Html, routing::get};
use calzone_core::render::CalendarView;
use chrono::Local;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cal", get(calendar_html))
        .route("/cal.json", get(calendar_json))
}

async fn render(state: &AppState) -> Result<CalendarView, AppError> {
    let today = Local::now().date_naive();
    state.run(move |calzone| calzone.render_calendar(today)).await
}

/// GET /cal - This month and next month as HTML
async fn calendar_html(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    Ok(Html(render(&state).await?.to_html()))
}

/// GET /cal.json - The same view as structured data
async fn calendar_json(State(state): State<AppState>) -> Result<Json<CalendarView>, AppError> {
    Ok(Json(render(&state).await?))
}
