//! In-memory job registry and archive scheduling.
//!
//! `JobStore` is a cheap `Clone` handle. All state sits behind one mutex that
//! is never held across an await. When a job's file list fills up it flips to
//! `running` and is queued for the worker pool under the same lock, so a job
//! is enqueued exactly once no matter how many attaches race.

mod error;
mod pool;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::archiver::ArchiveRunner;
use crate::model::{archive_url, FileEntry, Job, JobId, JobStatus};
use crate::validate::ValidationPolicy;

pub use error::{ErrorKind, StoreError};

use self::pool::{ArchiveTask, RunOutcome};

/// Admission and scheduling limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    /// Jobs in `pending` or `running` at once.
    pub max_active_jobs: usize,
    /// Files per job; reaching it starts the archive.
    pub max_files_per_job: usize,
    /// Archive runs in flight at once.
    pub archive_workers: usize,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            max_active_jobs: 3,
            max_files_per_job: 3,
            archive_workers: 3,
        }
    }
}

/// Number of jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub done: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn active(&self) -> usize {
        self.pending + self.running
    }
}

pub(crate) struct Shared {
    jobs: Mutex<HashMap<JobId, Job>>,
    limits: JobLimits,
    policy: Arc<ValidationPolicy>,
    queue: mpsc::UnboundedSender<ArchiveTask>,
}

#[derive(Clone)]
pub struct JobStore {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("limits", &self.shared.limits)
            .finish_non_exhaustive()
    }
}

impl JobStore {
    /// Create a store and start its worker pool. Must be called from within a
    /// Tokio runtime.
    pub fn new(limits: JobLimits, policy: Arc<ValidationPolicy>, runner: Arc<dyn ArchiveRunner>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            jobs: Mutex::new(HashMap::new()),
            limits,
            policy,
            queue: tx,
        });
        pool::spawn(rx, runner, Arc::downgrade(&shared), limits.archive_workers);
        Self { shared }
    }

    /// Register a new empty job, unless the active-job cap is reached.
    pub fn create_job(&self) -> Result<Job, StoreError> {
        let limit = self.shared.limits.max_active_jobs;
        let mut jobs = self.shared.lock();
        let active = jobs.values().filter(|j| j.status.is_active()).count();
        if active >= limit {
            return Err(StoreError::TooManyActiveJobs { limit });
        }
        let job = Job::new(uuid::Uuid::new_v4(), Utc::now());
        jobs.insert(job.id, job.clone());
        drop(jobs);
        tracing::info!(job_id = %job.id, "job created");
        Ok(job)
    }

    /// Append `url` to a pending job. The URL is checked before the job is
    /// looked up and stored trimmed, as it was validated. The attach that
    /// fills the job starts its archive run.
    pub fn attach_file(&self, job_id: &JobId, url: &str) -> Result<(), StoreError> {
        let url = url.trim();
        self.shared.policy.check_url(url)?;

        let limit = self.shared.limits.max_files_per_job;
        let mut jobs = self.shared.lock();
        let job = jobs.get_mut(job_id).ok_or(StoreError::JobNotFound)?;
        if job.status != JobStatus::Pending {
            return Err(StoreError::InvalidJobState(job.status));
        }
        if job.files.len() >= limit {
            return Err(StoreError::TooManyFiles { limit });
        }
        job.files.push(FileEntry::new(url));
        tracing::debug!(job_id = %job_id, url = %url, files = job.files.len(), "file attached");

        if job.files.len() == limit {
            job.status = JobStatus::Running;
            let task = ArchiveTask {
                job_id: *job_id,
                urls: job.urls(),
            };
            if self.shared.queue.send(task).is_err() {
                job.status = JobStatus::Error;
                tracing::error!(job_id = %job_id, "archive worker pool is gone");
            } else {
                tracing::info!(job_id = %job_id, "job queued for archiving");
            }
        }
        Ok(())
    }

    /// Snapshot of a job. Later changes in the store do not affect it.
    pub fn get_job(&self, job_id: &JobId) -> Result<Job, StoreError> {
        self.shared
            .lock()
            .get(job_id)
            .cloned()
            .ok_or(StoreError::JobNotFound)
    }

    /// Remove `done`/`error` jobs created more than `max_age` ago. Pending and
    /// running jobs are never removed. Returns how many were removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut jobs = self.shared.lock();
        let before = jobs.len();
        jobs.retain(|_, job| {
            if !job.status.is_terminal() {
                return true;
            }
            // A created_at in the future yields an error here: keep the job.
            (now - job.created_at)
                .to_std()
                .map_or(true, |age| age <= max_age)
        });
        let removed = before - jobs.len();
        drop(jobs);
        if removed > 0 {
            tracing::info!(removed, "expired jobs removed");
        }
        removed
    }

    /// True if the job exists and is pending or running.
    pub fn is_active(&self, job_id: &JobId) -> bool {
        self.shared
            .lock()
            .get(job_id)
            .is_some_and(|j| j.status.is_active())
    }

    pub fn status_counts(&self) -> StatusCounts {
        let jobs = self.shared.lock();
        let mut counts = StatusCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Error => counts.error += 1,
            }
        }
        counts
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the outcome of an archive run back into the job. Only a running
    /// job is updated.
    fn complete(&self, job_id: JobId, outcome: RunOutcome) {
        let mut jobs = self.lock();
        let Some(job) = jobs.get_mut(&job_id) else {
            tracing::debug!(%job_id, "finished job no longer in store");
            return;
        };
        if job.status != JobStatus::Running {
            tracing::warn!(%job_id, status = %job.status, "ignoring archive result for job not running");
            return;
        }

        match outcome {
            RunOutcome::Packed(failures) => {
                for entry in job.files.iter_mut() {
                    entry.mark_success();
                }
                for failure in failures {
                    let reason = failure.reason.to_string();
                    let by_index = job
                        .files
                        .get(failure.index)
                        .is_some_and(|e| e.url == failure.url);
                    let slot = if by_index {
                        Some(failure.index)
                    } else {
                        job.files.iter().position(|e| e.url == failure.url)
                    };
                    match slot {
                        Some(i) => job.files[i].mark_failed(reason),
                        None => tracing::warn!(%job_id, url = %failure.url, "failure for unknown url"),
                    }
                }
                job.status = JobStatus::Done;
                job.archive_url = Some(archive_url(&job_id));
                tracing::info!(%job_id, "job done");
            }
            RunOutcome::Failed(e) => {
                job.status = JobStatus::Error;
                tracing::error!(%job_id, "archive run failed: {}", e);
            }
        }
    }
}
