//! Errors returned by job store operations.

use crate::model::JobStatus;
use crate::validate::Rejection;

/// Broad class of a `StoreError`, used by callers to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Too many active jobs; retry later.
    Admission,
    /// The URL was refused by the validation policy.
    Validation,
    /// Unknown job id.
    Lookup,
    /// Operation not allowed in the job's current state.
    State,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("too many active jobs (limit {limit})")]
    TooManyActiveJobs { limit: usize },
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("job not found")]
    JobNotFound,
    #[error("cannot add files to job in status: {0}")]
    InvalidJobState(JobStatus),
    #[error("too many files in job (limit {limit})")]
    TooManyFiles { limit: usize },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::TooManyActiveJobs { .. } => ErrorKind::Admission,
            StoreError::Rejected(_) => ErrorKind::Validation,
            StoreError::JobNotFound => ErrorKind::Lookup,
            StoreError::InvalidJobState(_) | StoreError::TooManyFiles { .. } => ErrorKind::State,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::TooManyActiveJobs { .. } => "TOO_MANY_ACTIVE_JOBS",
            StoreError::Rejected(_) => "INVALID_URL",
            StoreError::JobNotFound => "JOB_NOT_FOUND",
            StoreError::InvalidJobState(_) => "INVALID_JOB_STATE",
            StoreError::TooManyFiles { .. } => "TOO_MANY_FILES",
        }
    }
}
