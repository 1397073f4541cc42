//! `fetchpack sweep` – one-off removal of expired archives.
//!
//! Runs outside the server, so no job is known to be active: every `*.zip`
//! older than the retention period is removed.

use anyhow::Result;
use fetchpack_core::reaper;
use std::path::Path;
use std::time::Duration;

pub fn run_sweep(archive_dir: &Path, max_age: Duration) -> Result<usize> {
    let removed = reaper::sweep_archives(archive_dir, max_age, |_| false)?;
    tracing::info!(
        dir = %archive_dir.display(),
        removed,
        max_age_secs = max_age.as_secs(),
        "archive sweep"
    );
    Ok(removed)
}
