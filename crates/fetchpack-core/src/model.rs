//! Job and file records owned by the job store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job identifier.
pub type JobId = uuid::Uuid;

/// Lifecycle state of a job. Transitions only move forward:
/// `Pending` → `Running` → `Done` | `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Pending or running; counted against the admission cap.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attached URL. `success` stays `None` until the archiver has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FileEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: None,
            reason: None,
        }
    }

    pub(crate) fn mark_success(&mut self) {
        self.success = Some(true);
        self.reason = None;
    }

    pub(crate) fn mark_failed(&mut self, reason: impl Into<String>) {
        self.success = Some(false);
        self.reason = Some(reason.into());
    }
}

/// A fetch job. Values handed out by the store are independent copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub files: Vec<FileEntry>,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    /// Set only once the job is `Done`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
}

impl Job {
    pub(crate) fn new(id: JobId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            files: Vec::new(),
            created_at,
            status: JobStatus::Pending,
            archive_url: None,
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.files.iter().map(|f| f.url.clone()).collect()
    }
}

/// Archive file name for a job (`<id>.zip`).
pub fn archive_file_name(id: &JobId) -> String {
    format!("{}.zip", id)
}

/// Public location a finished archive is served from.
pub fn archive_url(id: &JobId) -> String {
    format!("/archives/{}", archive_file_name(id))
}
