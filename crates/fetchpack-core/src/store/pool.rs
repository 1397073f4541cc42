//! Bounded archive worker pool.
//!
//! A dispatcher task takes jobs off the store's queue and keeps at most
//! `workers` archive runs in flight; when one finishes, the next queued job is
//! started. Each run executes the blocking archiver on the blocking thread
//! pool and then writes its outcome back into the store.

use std::sync::{Arc, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::archiver::{ArchiveRunner, FileFailure};
use crate::model::JobId;

use super::Shared;

/// A job that reached its file count and waits for a worker slot.
#[derive(Debug)]
pub(super) struct ArchiveTask {
    pub(super) job_id: JobId,
    pub(super) urls: Vec<String>,
}

/// Result of one archive run as seen by the store.
#[derive(Debug)]
pub(super) enum RunOutcome {
    Packed(Vec<FileFailure>),
    /// No container could be produced (or the run panicked).
    Failed(String),
}

/// Spawns the dispatcher. It exits once the queue is closed (every store
/// handle dropped) and all in-flight runs have finished.
pub(super) fn spawn(
    mut queue: mpsc::UnboundedReceiver<ArchiveTask>,
    runner: Arc<dyn ArchiveRunner>,
    store: Weak<Shared>,
    workers: usize,
) -> tokio::task::JoinHandle<()> {
    let workers = workers.max(1);
    tokio::spawn(async move {
        let mut join_set = JoinSet::new();
        let mut queue_open = true;

        loop {
            tokio::select! {
                task = queue.recv(), if queue_open && join_set.len() < workers => {
                    match task {
                        Some(task) => {
                            let runner = Arc::clone(&runner);
                            let store = store.clone();
                            join_set.spawn(run_one(task, runner, store));
                        }
                        None => queue_open = false,
                    }
                }
                Some(res) = join_set.join_next(), if !join_set.is_empty() => {
                    if let Err(e) = res {
                        tracing::error!("archive worker join: {}", e);
                    }
                }
                else => break,
            }
        }
        tracing::debug!("archive worker pool stopped");
    })
}

async fn run_one(task: ArchiveTask, runner: Arc<dyn ArchiveRunner>, store: Weak<Shared>) {
    let ArchiveTask { job_id, urls } = task;
    tracing::debug!(%job_id, files = urls.len(), "archive run started");

    let joined = tokio::task::spawn_blocking(move || runner.run(&job_id, &urls)).await;
    let outcome = match joined {
        Ok(Ok(failures)) => RunOutcome::Packed(failures),
        Ok(Err(e)) => RunOutcome::Failed(e.to_string()),
        Err(e) => RunOutcome::Failed(format!("archive task panicked: {}", e)),
    };

    match store.upgrade() {
        Some(shared) => shared.complete(job_id, outcome),
        None => tracing::debug!(%job_id, "store dropped before archive run finished"),
    }
}
