//! CLI for the fetchpack server.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchpack_core::config::{self, FetchpackConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

use commands::{run_config_path, run_serve, run_sweep};

/// Top-level CLI for fetchpack.
#[derive(Debug, Parser)]
#[command(name = "fetchpack")]
#[command(about = "fetchpack: fetch files into per-job zip archives over HTTP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP API, the archive workers and the periodic reaper.
    Serve {
        /// Config file to use instead of the XDG default.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Listen port (overrides `server.port`).
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,
        /// Archive directory (overrides `archive_dir`).
        #[arg(long, value_name = "DIR")]
        archive_dir: Option<PathBuf>,
    },

    /// Delete expired archives from the archive directory once and exit.
    Sweep {
        /// Config file to use instead of the XDG default.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Archive directory (overrides `archive_dir`).
        #[arg(long, value_name = "DIR")]
        archive_dir: Option<PathBuf>,
        /// Retention in seconds (overrides `retention.max_age_secs`).
        #[arg(long, value_name = "SECS")]
        max_age_secs: Option<u64>,
    },

    /// Print the default config file path.
    ConfigPath,
}

fn load_config(path: Option<&Path>) -> Result<FetchpackConfig> {
    match path {
        Some(p) => config::load_from_path(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Serve {
                config,
                port,
                archive_dir,
            } => {
                let mut cfg = load_config(config.as_deref())?;
                if let Some(port) = port {
                    cfg.server.port = port;
                }
                if let Some(dir) = archive_dir {
                    cfg.archive_dir = dir;
                }
                tracing::debug!("loaded config: {:?}", cfg);
                run_serve(cfg).await?;
            }
            CliCommand::Sweep {
                config,
                archive_dir,
                max_age_secs,
            } => {
                let cfg = load_config(config.as_deref())?;
                let dir = archive_dir.unwrap_or_else(|| cfg.archive_dir.clone());
                let max_age = max_age_secs
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| cfg.retention());
                let removed = run_sweep(&dir, max_age)?;
                println!("removed {} archive(s) from {}", removed, dir.display());
            }
            CliCommand::ConfigPath => run_config_path()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
