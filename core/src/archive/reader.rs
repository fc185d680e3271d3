//! archive/reader.rs
//! Enumerate a zip archive held in memory.

use std::io::{Cursor, Read};

use bytes::Bytes;
use zip::ZipArchive;

use crate::archive::types::{ArchiveEntry, ArchiveError};

/// Read every member of `bytes` in archive order.
///
/// Paths are normalised to forward slashes and must be relative without `..`.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = normalize_path(file.name())?;

        if file.is_dir() {
            entries.push(ArchiveEntry::Directory(path));
            continue;
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push(ArchiveEntry::File { path, data: Bytes::from(data) });
    }

    Ok(entries)
}

fn normalize_path(raw: &str) -> Result<String, ArchiveError> {
    let path = raw.replace('\\', "/");
    if path.starts_with('/') || path.split('/').any(|part| part == "..") {
        return Err(ArchiveError::UnsafePath(raw.to_owned()));
    }
    Ok(path)
}
