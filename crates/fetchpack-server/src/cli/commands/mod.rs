//! CLI command handlers, one file per command.

mod config_path;
mod serve;
mod sweep;

pub use config_path::run_config_path;
pub use serve::run_serve;
pub use sweep::run_sweep;
