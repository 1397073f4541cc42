//! Download-and-pack worker.
//!
//! For each URL of a job: validate, fetch with a timeout, check the response,
//! and stream accepted bodies into one zip container. Per-URL problems become
//! `FileFailure`s; only a container that cannot be created or finalized is an
//! error for the whole run.

mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use crate::fetch::{self, FailureReason, FetchOptions};
use crate::model::{archive_file_name, JobId};
use crate::storage::ArchiveWriter;
use crate::validate::ValidationPolicy;

pub use crate::storage::ArchiveError;

use self::sink::EntrySink;

/// One URL that did not make it into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Position of the URL in the job's file list.
    pub index: usize,
    pub url: String,
    pub reason: FailureReason,
}

/// Runs the archive step for a job. Implementations block; the worker pool
/// calls them from `spawn_blocking`.
pub trait ArchiveRunner: Send + Sync + 'static {
    /// Fetch and pack `urls` into the job's container. Returns every per-URL
    /// failure (possibly none), or an error if no container could be produced.
    fn run(&self, job_id: &JobId, urls: &[String]) -> Result<Vec<FileFailure>, ArchiveError>;
}

/// The real archiver: libcurl fetches into `<archive_dir>/<job_id>.zip`.
#[derive(Debug, Clone)]
pub struct Archiver {
    policy: Arc<ValidationPolicy>,
    archive_dir: PathBuf,
    fetch: FetchOptions,
}

impl Archiver {
    pub fn new(policy: Arc<ValidationPolicy>, archive_dir: impl Into<PathBuf>, fetch: FetchOptions) -> Self {
        Self {
            policy,
            archive_dir: archive_dir.into(),
            fetch,
        }
    }

    pub fn archive_path(&self, job_id: &JobId) -> PathBuf {
        self.archive_dir.join(archive_file_name(job_id))
    }

    /// Fetch one URL into a new entry. On failure the entry, if started, is
    /// left open for the caller to abort.
    fn pack_one(&self, writer: &mut ArchiveWriter, url: &str) -> Result<(String, u64), FailureReason> {
        self.policy.check_url(url)?;
        let mut sink = EntrySink::new(writer, url);
        let bytes = fetch::fetch_into(url, &self.fetch, &self.policy, &mut sink)?;
        let name = sink.into_entry_name().unwrap_or_default();
        writer.finish_entry();
        Ok((name, bytes))
    }
}

impl ArchiveRunner for Archiver {
    fn run(&self, job_id: &JobId, urls: &[String]) -> Result<Vec<FileFailure>, ArchiveError> {
        let path = self.archive_path(job_id);
        let mut writer = ArchiveWriter::create(&path)?;
        let mut failures = Vec::new();

        for (index, url) in urls.iter().enumerate() {
            match self.pack_one(&mut writer, url) {
                Ok((entry, bytes)) => {
                    tracing::debug!(%job_id, url = %url, entry = %entry, bytes, "packed file");
                }
                Err(reason) => {
                    tracing::warn!(%job_id, url = %url, reason = %reason, "file not packed");
                    if writer.has_open_entry() {
                        if let Err(source) = writer.abort_entry() {
                            writer.discard();
                            return Err(ArchiveError::Abort { path, source });
                        }
                    }
                    failures.push(FileFailure {
                        index,
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }

        let path = writer.finalize()?;
        tracing::info!(
            %job_id,
            path = %path.display(),
            packed = urls.len() - failures.len(),
            failed = failures.len(),
            "archive written"
        );
        Ok(failures)
    }
}
