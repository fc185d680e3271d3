//! archive/writer.rs
//! Build a zip archive in memory. Nothing is visible to the caller until `finish`.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::types::ArchiveError;

pub struct ArchiveBuilder {
    inner: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    written: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::with_compression(CompressionMethod::Deflated)
    }

    pub fn with_compression(method: CompressionMethod) -> Self {
        Self {
            inner: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(method),
            written: HashSet::new(),
        }
    }

    /// Add an empty directory. Repeated paths are ignored.
    pub fn add_directory(&mut self, path: &str) -> Result<(), ArchiveError> {
        let path = if path.ends_with('/') { path.to_owned() } else { format!("{path}/") };
        if !self.written.insert(path.clone()) {
            return Ok(());
        }
        self.inner
            .add_directory(path, self.options)
            .map_err(|e| ArchiveError::Write(e.to_string()))
    }

    /// Add a file. Writing the same path twice is an error.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> Result<(), ArchiveError> {
        if !self.written.insert(path.to_owned()) {
            return Err(ArchiveError::Write(format!("duplicate entry {path}")));
        }
        self.inner
            .start_file(path, self.options)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        self.inner.write_all(data)?;
        Ok(())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.written.contains(path)
    }

    /// Finalize the central directory and hand back the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self
            .inner
            .finish()
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}
