//! `fetchpack serve` – run the HTTP API until Ctrl-C.

use anyhow::{Context, Result};
use fetchpack_core::archiver::Archiver;
use fetchpack_core::config::FetchpackConfig;
use fetchpack_core::fetch::FetchOptions;
use fetchpack_core::reaper::Reaper;
use fetchpack_core::store::JobStore;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::http::{self, AppState};

pub async fn run_serve(cfg: FetchpackConfig) -> Result<()> {
    std::fs::create_dir_all(&cfg.archive_dir)
        .with_context(|| format!("create archive dir {}", cfg.archive_dir.display()))?;

    let policy = Arc::new(cfg.policy());
    let limits = cfg.limits();
    let archiver = Archiver::new(
        Arc::clone(&policy),
        &cfg.archive_dir,
        FetchOptions {
            timeout: cfg.fetch_timeout(),
        },
    );
    let store = JobStore::new(limits, policy, Arc::new(archiver));
    tracing::info!(
        max_active_jobs = limits.max_active_jobs,
        max_files_per_job = limits.max_files_per_job,
        archive_workers = limits.archive_workers,
        archive_dir = %cfg.archive_dir.display(),
        "job store ready"
    );

    let reaper = Reaper::new(store.clone(), &cfg.archive_dir, cfg.retention());
    let reaper_task = reaper.clone().spawn(cfg.sweep_interval());

    let state = AppState::new(store, reaper, cfg.archive_dir.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let result = http::serve(addr, state, shutdown_signal()).await;

    reaper_task.abort();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
