//! Periodic removal of expired archives and job records.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::model::JobId;
use crate::store::JobStore;

/// Remove `*.zip` files in `dir` whose modification time is more than
/// `retention` ago. Archives named after a job for which `skip` returns true
/// are left alone. A missing directory counts as empty.
pub fn sweep_archives<F>(dir: &Path, retention: Duration, skip: F) -> Result<usize>
where
    F: Fn(&JobId) -> bool,
{
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("read archive dir {}", dir.display())),
    };

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in entries {
        let entry = entry.with_context(|| format!("read archive dir {}", dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("zip") {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        let job_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| uuid::Uuid::parse_str(s).ok());
        if job_id.as_ref().is_some_and(&skip) {
            continue;
        }

        let modified = meta
            .modified()
            .with_context(|| format!("mtime of {}", path.display()))?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= retention {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "removed expired archive");
                removed += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), "remove expired archive: {}", e),
        }
    }
    Ok(removed)
}

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub archives_removed: usize,
    pub jobs_removed: usize,
}

/// Removes archives and job records older than the retention period.
#[derive(Debug, Clone)]
pub struct Reaper {
    store: JobStore,
    archive_dir: PathBuf,
    retention: Duration,
}

impl Reaper {
    pub fn new(store: JobStore, archive_dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            store,
            archive_dir: archive_dir.into(),
            retention,
        }
    }

    /// One pass: expired archives (never those of active jobs), then expired
    /// job records.
    pub fn sweep(&self) -> Result<SweepReport> {
        let archives_removed =
            sweep_archives(&self.archive_dir, self.retention, |id| self.store.is_active(id))?;
        let jobs_removed = self.store.cleanup(self.retention);
        let report = SweepReport {
            archives_removed,
            jobs_removed,
        };
        if report != SweepReport::default() {
            tracing::info!(archives_removed, jobs_removed, "sweep finished");
        }
        Ok(report)
    }

    /// Sweep now and then every `interval` until the runtime shuts down.
    pub fn spawn(self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let interval = interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let reaper = self.clone();
                match tokio::task::spawn_blocking(move || reaper.sweep()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => tracing::warn!("sweep failed: {:#}", e),
                    Err(e) => tracing::error!("sweep task: {}", e),
                }
            }
        })
    }
}
