//! HTTP API Request Handlers
//!
//! Thin mappings from routes to `JobStore` operations. Store calls never
//! block on I/O; archive reads and sweeps go through tokio.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fetchpack_core::model::JobId;
use fetchpack_core::reaper::Reaper;
use fetchpack_core::store::{ErrorKind, JobStore, StoreError};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use super::types::{AttachFileRequest, ErrorResponse, HealthResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub reaper: Reaper,
    pub archive_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(store: JobStore, reaper: Reaper, archive_dir: PathBuf) -> Self {
        Self {
            store,
            reaper,
            archive_dir: Arc::new(archive_dir),
        }
    }
}

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

fn store_error(err: &StoreError) -> Response {
    let status = match err.kind() {
        ErrorKind::Admission => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Validation | ErrorKind::State => StatusCode::BAD_REQUEST,
        ErrorKind::Lookup => StatusCode::NOT_FOUND,
    };
    error_response(status, ErrorResponse::new(err.code(), err.to_string()))
}

/// A malformed id can never name a job, so it is reported as not found.
fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    uuid::Uuid::parse_str(raw).map_err(|_| store_error(&StoreError::JobNotFound))
}

/// Create an empty job
pub async fn create_job(State(state): State<AppState>) -> Response {
    match state.store.create_job() {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(e) => {
            debug!("create job refused: {}", e);
            store_error(&e)
        }
    }
}

/// Attach one URL to a pending job
pub async fn attach_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AttachFileRequest>, JsonRejection>,
) -> Response {
    let job_id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorResponse::bad_request(rejection.body_text()),
            )
        }
    };

    match state.store.attach_file(&job_id, &request.url) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            debug!(job_id = %job_id, url = %request.url, "attach refused: {}", e);
            store_error(&e)
        }
    }
}

/// Current state of a job
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let job_id = match parse_job_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.store.get_job(&job_id) {
        Ok(job) => Json(job).into_response(),
        Err(e) => store_error(&e),
    }
}

/// True for names of the form `<uuid>.zip`.
fn is_archive_name(file: &str) -> bool {
    file.strip_suffix(".zip")
        .is_some_and(|stem| uuid::Uuid::parse_str(stem).is_ok())
}

/// Stream a finished archive
pub async fn download_archive(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    if !is_archive_name(&file) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_ARCHIVE_NAME", "Archive name must be <job id>.zip"),
        );
    }

    let path = state.archive_dir.join(&file);
    let handle = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return error_response(
                StatusCode::NOT_FOUND,
                ErrorResponse::new("ARCHIVE_NOT_FOUND", "Archive not found"),
            );
        }
        Err(e) => {
            error!(path = %path.display(), "open archive: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal_error("Failed to open archive"),
            );
        }
    };
    let len = match handle.metadata().await {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            warn!(path = %path.display(), "archive metadata: {}", e);
            None
        }
    };

    let body = Body::from_stream(ReaderStream::new(handle));
    let mut response = (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file),
            ),
        ],
        body,
    )
        .into_response();
    if let Some(len) = len {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, header::HeaderValue::from(len));
    }
    response
}

/// Run the reaper now
pub async fn cleanup(State(state): State<AppState>) -> Response {
    let reaper = state.reaper.clone();
    match tokio::task::spawn_blocking(move || reaper.sweep()).await {
        Ok(Ok(report)) => Json(report).into_response(),
        Ok(Err(e)) => {
            error!("cleanup failed: {:#}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal_error(format!("Cleanup failed: {}", e)),
            )
        }
        Err(e) => {
            error!("cleanup task: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal_error("Cleanup task failed"),
            )
        }
    }
}

/// Liveness plus job counts
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        jobs: state.store.status_counts(),
    })
}
