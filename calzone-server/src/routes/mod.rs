pub mod api;
pub mod calendar;
pub mod removal;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use calzone_core::CalzoneError;
use calzone_core::display::escape_title;
use tracing::error;

/// The status fragment the add form swaps in after a submission.
pub fn response_html(message: &str, is_error: bool) -> String {
    let message = escape_title(message);
    if is_error {
        format!(
            "<h1 id=\"response\" class=\"showError\">There was an error:</h1><br>\
             <h1 id=\"response\" class=\"showError\">{message}</h1>"
        )
    } else {
        format!("<h1 id=\"response\" class=\"showOK\">{message}</h1>")
    }
}

/// Errors leaving a handler.
#[derive(Debug)]
pub enum AppError {
    Calzone(CalzoneError),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Calzone(e) if e.is_user_error() => {
                (StatusCode::OK, Html(response_html(&e.to_string(), true))).into_response()
            }
            AppError::Calzone(e) => {
                error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(response_html(&e.to_string(), true)),
                )
                    .into_response()
            }
            AppError::Internal(e) => {
                error!(error = %e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(response_html("Internal server error", true)),
                )
                    .into_response()
            }
        }
    }
}

impl From<CalzoneError> for AppError {
    fn from(err: CalzoneError) -> Self {
        Self::Calzone(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.into())
    }
}
