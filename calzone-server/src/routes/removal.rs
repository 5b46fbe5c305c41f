//! Event deletion endpoint
//!
//! The first POST (no `response` field) shows a confirmation dialog; the
//! dialog posts back with `response=Yes` or `response=No`.

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::post,
};
use calzone_core::CalzoneError;
use calzone_core::deletion::{DeletionOutcome, DeletionRef};
use calzone_core::display::escape_title;
use serde::Deserialize;
use tracing::error;

use crate::routes::AppError;
use crate::state::AppState;

const CLOSE_DIALOG: &str = "<div id=\"dialog\" style=\"animation: popup reverse 0.5s ease;\"></div>";

pub fn router() -> Router<AppState> {
    Router::new().route("/mod", post(remove_event))
}

#[derive(Deserialize)]
pub struct RemovalForm {
    #[serde(default)]
    del: String,
    #[serde(default)]
    month: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    response: String,
}

fn dialog(message: &str) -> Html<String> {
    Html(format!("<div id=\"dialog\" class=\"dgOpen\"><p>{message}</p></div>"))
}

fn confirmation_dialog(reference: DeletionRef, title: &str) -> Html<String> {
    Html(format!(
        "<div id=\"dialog\" class=\"dgOpen\"><p>You are about to remove event \"<strong>{title}</strong>\" from the calendar.<br/><br/>\
         Are you sure you want to continue?</p><br/><br/>\n\
         <form hx-post=\"/mod\" hx-target=\"#dialog\" hx-swap=\"outerHTML\" hx-indicator=\"#throbber\" method=\"post\">\n\
         <input type=\"text\" name=\"month\" value=\"{month}\" style=\"display: none;\">\n\
         <input type=\"text\" name=\"del\" value=\"{position}\" style=\"display: none;\">\n\
         <input type=\"text\" name=\"year\" value=\"{year}\" style=\"display: none;\">\n\
         <input type=\"submit\" name=\"response\" value=\"Yes\" />\n\
         <input type=\"submit\" name=\"response\" value=\"No\" />\n\
         </form></div>",
        title = escape_title(title),
        month = reference.key.month_padded(),
        position = reference.position,
        year = reference.key.year(),
    ))
}

/// POST /mod - Request or confirm deletion of one event
async fn remove_event(
    State(state): State<AppState>,
    Form(form): Form<RemovalForm>,
) -> Response {
    let reference = match DeletionRef::parse(&form.month, &form.year, &form.del) {
        Ok(reference) => reference,
        Err(_) => return dialog("Invalid request.").into_response(),
    };

    let result = if form.response.is_empty() {
        state
            .run(move |calzone| calzone.request_deletion(reference))
            .await
            .map(|pending| confirmation_dialog(reference, pending.title()))
    } else {
        let accepted = form.response == "Yes";
        state
            .run(move |calzone| calzone.confirm_deletion(reference, accepted))
            .await
            .map(|outcome| match outcome {
                DeletionOutcome::Applied { .. } => Html(format!(
                    "{CLOSE_DIALOG}<script>location.reload()</script>"
                )),
                DeletionOutcome::Declined => Html(CLOSE_DIALOG.to_string()),
            })
    };

    match result {
        Ok(html) => html.into_response(),
        Err(AppError::Calzone(CalzoneError::OutOfRange { .. })) => {
            dialog("That event no longer exists. Reload the calendar and try again.")
                .into_response()
        }
        Err(AppError::Calzone(e)) if e.is_user_error() => {
            dialog(&escape_title(&e.to_string())).into_response()
        }
        Err(AppError::Calzone(e)) => {
            error!(error = %e, "deletion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                dialog(&escape_title(&e.to_string())),
            )
                .into_response()
        }
        Err(other) => other.into_response(),
    }
}
