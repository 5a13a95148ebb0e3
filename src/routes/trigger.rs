//! Job trigger endpoint.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use http::StatusCode;

use crate::{AppState, retention::JobOutcome};

impl IntoResponse for JobOutcome {
    fn into_response(self) -> Response {
        let status = match self {
            JobOutcome::Success => StatusCode::OK,
            JobOutcome::Fail => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, [("content-type", "text/plain; charset=utf-8")], self.as_str()).into_response()
    }
}

/// Run the retention job once.
///
/// Responds with the plain-text literal `Success` (200) or `Fail` (500).
/// Concurrent requests start concurrent runs; the scheduler is expected to
/// serialize them.
#[tracing::instrument(name = "retention.trigger", skip(state))]
pub async fn run_job(State(state): State<AppState>) -> JobOutcome {
    state.job.trigger().await
}
