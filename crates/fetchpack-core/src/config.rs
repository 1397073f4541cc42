use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::JobLimits;
use crate::validate::ValidationPolicy;

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// What may be attached and packed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Extensions accepted at attach time (e.g. ".pdf"). Empty = any extension.
    pub allowed_extensions: Vec<String>,
    /// Response content types accepted for packing. Empty = any type.
    pub allowed_content_types: Vec<String>,
    /// Per-file byte cap.
    pub max_file_size: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec![".pdf".into(), ".jpeg".into(), ".jpg".into()],
            allowed_content_types: vec![
                "application/pdf".into(),
                "image/jpeg".into(),
                "image/jpg".into(),
            ],
            max_file_size: 20 * 1024 * 1024,
        }
    }
}

/// Admission and worker limits (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum jobs pending or running at once.
    pub max_active_jobs: usize,
    /// Files a job needs before it starts archiving.
    pub max_files_per_job: usize,
    /// Archive runs allowed to execute concurrently.
    pub archive_workers: usize,
    /// Per-URL fetch timeout in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_active_jobs: 3,
            max_files_per_job: 3,
            archive_workers: 3,
            fetch_timeout_secs: 30,
        }
    }
}

/// How long archives and finished jobs are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_age_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 3600,
            sweep_interval_secs: 3600,
        }
    }
}

/// Global configuration loaded from `~/.config/fetchpack/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchpackConfig {
    /// Directory finished archives are written to and served from.
    pub archive_dir: PathBuf,
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub limits: LimitsConfig,
    pub retention: RetentionConfig,
}

impl FetchpackConfig {
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(
            &self.files.allowed_extensions,
            &self.files.allowed_content_types,
            self.files.max_file_size,
        )
    }

    pub fn limits(&self) -> JobLimits {
        JobLimits {
            max_active_jobs: self.limits.max_active_jobs.max(1),
            max_files_per_job: self.limits.max_files_per_job.max(1),
            archive_workers: self.limits.archive_workers.max(1),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.fetch_timeout_secs.max(1))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention.max_age_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention.sweep_interval_secs.max(1))
    }

    fn fill_defaults(mut self) -> Self {
        if self.archive_dir.as_os_str().is_empty() {
            self.archive_dir = PathBuf::from(DEFAULT_ARCHIVE_DIR);
        }
        self
    }
}

/// Archive directory used when the config leaves it empty.
pub const DEFAULT_ARCHIVE_DIR: &str = "archives";

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchpack")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchpackConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchpackConfig::default().fill_defaults();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file. Missing keys take defaults.
pub fn load_from_path(path: &Path) -> Result<FetchpackConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse(&data).with_context(|| format!("parse config {}", path.display()))
}

fn parse(data: &str) -> Result<FetchpackConfig> {
    let cfg: FetchpackConfig = toml::from_str(data)?;
    Ok(cfg.fill_defaults())
}
