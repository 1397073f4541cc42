//! Route tests, driven in-process through `tower::ServiceExt::oneshot`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use fetchpack_core::archiver::{ArchiveError, ArchiveRunner, FileFailure};
use fetchpack_core::fetch::FailureReason;
use fetchpack_core::model::{archive_file_name, JobId};
use fetchpack_core::reaper::Reaper;
use fetchpack_core::store::{JobLimits, JobStore};
use fetchpack_core::validate::ValidationPolicy;
use serde_json::Value;
use tower::ServiceExt;

use super::{create_router, AppState};

const ZIP_BYTES: &[u8] = b"PK\x05\x06\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";

/// Writes a fixed archive and fails the second URL, without any network.
struct StubRunner {
    dir: PathBuf,
}

impl ArchiveRunner for StubRunner {
    fn run(&self, job_id: &JobId, urls: &[String]) -> Result<Vec<FileFailure>, ArchiveError> {
        let path = self.dir.join(archive_file_name(job_id));
        std::fs::write(&path, ZIP_BYTES).map_err(|source| ArchiveError::Create { path, source })?;
        Ok(urls
            .iter()
            .enumerate()
            .skip(1)
            .take(1)
            .map(|(index, url)| FileFailure {
                index,
                url: url.clone(),
                reason: FailureReason::HttpStatus(403),
            })
            .collect())
    }
}

fn state(dir: &Path) -> AppState {
    let policy = Arc::new(ValidationPolicy::new(
        [".pdf", ".jpg"],
        ["application/pdf", "image/jpeg"],
        1024,
    ));
    let runner = Arc::new(StubRunner {
        dir: dir.to_path_buf(),
    });
    let store = JobStore::new(JobLimits::default(), policy, runner);
    let reaper = Reaper::new(store.clone(), dir, Duration::from_secs(3600));
    AppState::new(store, reaper, dir.to_path_buf())
}

async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    create_router(state.clone())
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn new_job(state: &AppState) -> String {
    let response = send(state, Method::POST, "/jobs", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

async fn attach(state: &AppState, id: &str, url: &str) -> Response {
    send(
        state,
        Method::POST,
        &format!("/jobs/{}/files", id),
        Some(serde_json::json!({ "url": url })),
    )
    .await
}

async fn wait_status(state: &AppState, id: &str, want: &str) -> Value {
    for _ in 0..500 {
        let job = body_json(send(state, Method::GET, &format!("/jobs/{}", id), None).await).await;
        if job["status"] == want {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never reached {}", id, want);
}

#[tokio::test]
async fn create_job_returns_pending_job() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    let response = send(&state, Method::POST, "/jobs", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job = body_json(response).await;
    assert_eq!(job["status"], "pending");
    assert_eq!(job["files"], serde_json::json!([]));
    assert!(job["created_at"].is_string());
    assert!(job.get("archive_url").is_none());
}

#[tokio::test]
async fn admission_cap_is_429() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    for _ in 0..3 {
        new_job(&state).await;
    }
    let response = send(&state, Method::POST, "/jobs", None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"], "TOO_MANY_ACTIVE_JOBS");
    assert!(body["message"].as_str().unwrap().contains("too many active jobs"));
}

#[tokio::test]
async fn attach_errors() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    let id = new_job(&state).await;

    let response = attach(&state, &id, "ftp://files.example/a.pdf").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "INVALID_URL");

    let response = attach(&state, &uuid::Uuid::new_v4().to_string(), "https://files.example/a.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "JOB_NOT_FOUND");

    let response = attach(&state, "not-a-uuid", "https://files.example/a.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &state,
        Method::POST,
        &format!("/jobs/{}/files", id),
        Some(serde_json::json!({ "link": "https://files.example/a.pdf" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn full_job_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    let id = new_job(&state).await;

    for name in ["a.pdf", "b.pdf", "c.jpg"] {
        let response = attach(&state, &id, &format!("https://files.example/{}", name)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let job = wait_status(&state, &id, "done").await;
    let archive_url = format!("/archives/{}.zip", id);
    assert_eq!(job["archive_url"], archive_url.as_str());
    assert_eq!(job["files"][0]["success"], true);
    assert_eq!(job["files"][1]["success"], false);
    assert_eq!(job["files"][1]["reason"], "HTTP 403");
    assert_eq!(job["files"][2]["success"], true);
    assert!(job["files"][0].get("reason").is_none());

    // The status alias serves the same document.
    let alias = body_json(send(&state, Method::GET, &format!("/jobs/{}/status", id), None).await).await;
    assert_eq!(alias, job);

    let response = attach(&state, &id, "https://files.example/d.pdf").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "INVALID_JOB_STATE");

    let response = send(&state, Method::GET, &archive_url, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        ZIP_BYTES.len().to_string().as_str()
    );
    assert_eq!(body_bytes(response).await, ZIP_BYTES);
}

#[tokio::test]
async fn get_unknown_job_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    let uri = format!("/jobs/{}", uuid::Uuid::new_v4());
    let response = send(&state, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&state, Method::GET, "/jobs/12345", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_download_errors() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());

    let response = send(&state, Method::GET, "/archives/notes.txt", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "INVALID_ARCHIVE_NAME");

    let uri = format!("/archives/{}.zip", uuid::Uuid::new_v4());
    let response = send(&state, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_cleanup_reports_counts() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    let response = send(&state, Method::POST, "/admin/cleanup", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "archives_removed": 0, "jobs_removed": 0 })
    );
}

#[tokio::test]
async fn health_counts_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path());
    new_job(&state).await;
    let response = send(&state, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["jobs"]["pending"], 1);
    assert_eq!(body["jobs"]["done"], 0);
}
