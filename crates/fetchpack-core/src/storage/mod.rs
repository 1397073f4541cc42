//! Archive container lifecycle.
//!
//! Writes the zip to `<name>.part` and atomically renames it to the final
//! path once finalized, so readers and the reaper never see a partial `.zip`.

mod writer;

pub use writer::{ArchiveError, ArchiveWriter};

use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.zip` → `a.zip.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
