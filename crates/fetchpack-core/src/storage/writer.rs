//! Zip container writer with per-entry abort.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::temp_path;
use crate::url_model;

/// The container itself could not be produced. Fails the whole job.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to create archive {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to finalize archive {}: {source}", path.display())]
    Finish {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to discard partial entry in {}: {source}", path.display())]
    Abort {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move archive into place {}: {source}", path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn zip_io(e: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// Zip container being written to its `.part` temp file.
pub struct ArchiveWriter {
    zip: ZipWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    names: HashSet<String>,
    open_entry: Option<String>,
}

impl ArchiveWriter {
    /// Create the parent directory if needed and a fresh temp file next to
    /// `final_path`. Overwrites a stale temp file.
    pub fn create(final_path: &Path) -> Result<Self, ArchiveError> {
        let temp_path = temp_path(final_path);
        let create_err = |source| ArchiveError::Create {
            path: final_path.to_path_buf(),
            source,
        };
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(create_err)?;
        }
        let file = File::create(&temp_path).map_err(create_err)?;
        Ok(Self {
            zip: ZipWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            names: HashSet::new(),
            open_entry: None,
        })
    }

    /// Start a new entry named after `candidate`, made unique within this
    /// archive. Returns the name actually used.
    pub fn start_entry(&mut self, candidate: &str) -> io::Result<String> {
        let name = url_model::unique_entry_name(candidate, &self.names);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.zip.start_file(name.as_str(), options).map_err(zip_io)?;
        self.names.insert(name.clone());
        self.open_entry = Some(name.clone());
        Ok(name)
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.zip.write_all(data)
    }

    /// Mark the current entry complete; it is closed by the next
    /// `start_entry` or by `finalize`.
    pub fn finish_entry(&mut self) {
        self.open_entry = None;
    }

    pub fn has_open_entry(&self) -> bool {
        self.open_entry.is_some()
    }

    /// Drop the entry currently being written, including bytes already copied.
    pub fn abort_entry(&mut self) -> io::Result<()> {
        if let Some(name) = self.open_entry.take() {
            self.zip.abort_file().map_err(zip_io)?;
            self.names.remove(&name);
        }
        Ok(())
    }

    /// Number of entries written so far (an open entry counts).
    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    /// Write the central directory, sync, and rename the temp file to the
    /// final path. Consumes the writer. The temp file is removed on failure.
    pub fn finalize(self) -> Result<PathBuf, ArchiveError> {
        let file = match self.zip.finish() {
            Ok(file) => file,
            Err(source) => {
                let _ = fs::remove_file(&self.temp_path);
                return Err(ArchiveError::Finish {
                    path: self.final_path,
                    source,
                });
            }
        };
        let synced = file.sync_all();
        drop(file);
        if let Err(source) = synced.and_then(|()| fs::rename(&self.temp_path, &self.final_path)) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(ArchiveError::Rename {
                path: self.final_path,
                source,
            });
        }
        Ok(self.final_path)
    }

    /// Abandon the archive and remove its temp file.
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.zip);
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::debug!(path = %temp_path.display(), "remove temp archive: {}", e);
        }
    }
}
