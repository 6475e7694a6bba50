use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracker_core::{JobView, TrackingRequest};
use tracker_engine::{EngineHandle, JobId};
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

const NO_LOGS_YET: &str = "No logs yet. Submit a tracking request first.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub log_file: Arc<PathBuf>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/logs", get(show_logs))
        .route("/jobs/:id", get(job_status))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

/// Fields posted by the submission form.
#[derive(Debug, Deserialize)]
pub struct SubmissionForm {
    pub link: String,
    pub movie: String,
    pub from_time: String,
    pub to_time: String,
    #[serde(default)]
    pub screen: Option<String>,
    pub email: String,
}

impl From<SubmissionForm> for TrackingRequest {
    fn from(form: SubmissionForm) -> Self {
        TrackingRequest {
            page_url: form.link,
            item_name: form.movie,
            from_time: form.from_time,
            to_time: form.to_time,
            sub_filter: form.screen,
            recipient: form.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct JobStatusResponse {
    job_id: JobId,
    #[serde(flatten)]
    view: JobView,
}

async fn index() -> Html<&'static str> {
    Html(FORM_HTML)
}

async fn submit(State(state): State<AppState>, Form(form): Form<SubmissionForm>) -> Response {
    match state.engine.submit(form.into()) {
        Ok(job_id) => {
            tracker_info!("Background tracking job {} queued", job_id);
            Html(format!(
                "<h3>Tracking started! Job #{job_id}. \
                 <a href='/logs' target='_blank'>View logs</a> \
                 or <a href='/jobs/{job_id}'>check status</a>.</h3>"
            ))
            .into_response()
        }
        Err(err) => {
            tracker_warn!("Rejected tracking request: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(format!("<h3>Could not start tracking: {err}</h3>")),
            )
                .into_response()
        }
    }
}

async fn show_logs(State(state): State<AppState>) -> Response {
    match tokio::fs::read_to_string(state.log_file.as_ref()).await {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(err) if err.kind() == ErrorKind::NotFound => NO_LOGS_YET.into_response(),
        Err(err) => {
            tracker_error!("Could not read log file {:?}: {}", state.log_file, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> Result<Json<JobStatusResponse>, StatusCode> {
    state
        .engine
        .status(job_id)
        .map(|view| Json(JobStatusResponse { job_id, view }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn cancel_job(State(state): State<AppState>, Path(job_id): Path<JobId>) -> StatusCode {
    if state.engine.cancel(job_id) {
        tracker_info!("Cancellation requested for job {}", job_id);
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

const FORM_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"/><title>Show Tracker</title>
<style>
body{font-family:Arial;background:#f5f5f5;padding:30px}
.card{max-width:520px;margin:auto;background:#fff;padding:20px;border-radius:10px;box-shadow:0 0 8px rgba(0,0,0,0.1)}
label{font-weight:600}
input,button{width:100%;padding:8px;margin-top:6px;border-radius:6px;border:1px solid #ccc}
button{background:#007bff;color:#fff;border:none;padding:10px;margin-top:15px}
</style>
</head>
<body>
  <div class="card">
    <h2>Show Tracker</h2>
    <form method="post">
      <label>Listing page link</label><input name="link" required placeholder="https://...">
      <label>Movie name (as on site)</label><input name="movie" required>
      <label>From time (e.g. 04:00 PM)</label><input name="from_time" required placeholder="04:00 PM">
      <label>To time (e.g. 09:00 PM)</label><input name="to_time" required placeholder="09:00 PM">
      <label>Screen name (optional)</label><input name="screen" placeholder="PVR Gold / IMAX">
      <label>Email to notify</label><input name="email" type="email" required placeholder="you@example.com">
      <button type="submit">Start Tracking</button>
    </form>
    <p style="font-size:13px;color:#555;margin-top:8px">
      The tracker checks the page every few minutes. <a href="/logs" target="_blank">View live logs</a>
    </p>
  </div>
</body>
</html>
"#;
