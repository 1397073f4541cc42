//! Body sink that writes an accepted response into a zip entry.

use std::io;

use crate::fetch::{BodySink, ResponseHead};
use crate::storage::ArchiveWriter;
use crate::url_model;

pub(super) struct EntrySink<'a> {
    writer: &'a mut ArchiveWriter,
    url: &'a str,
    entry: Option<String>,
}

impl<'a> EntrySink<'a> {
    pub(super) fn new(writer: &'a mut ArchiveWriter, url: &'a str) -> Self {
        Self {
            writer,
            url,
            entry: None,
        }
    }

    pub(super) fn into_entry_name(self) -> Option<String> {
        self.entry
    }
}

impl BodySink for EntrySink<'_> {
    fn begin(&mut self, head: &ResponseHead) -> io::Result<()> {
        let content_type = head.content_type.as_deref().unwrap_or_default();
        let candidate = url_model::derive_entry_name(self.url, content_type);
        self.entry = Some(self.writer.start_entry(&candidate)?);
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_chunk(chunk)
    }
}
