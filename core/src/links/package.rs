//! links/package.rs
//! Bundle named byte streams into one deflate-compressed zip on disk.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::archive::ArchiveBuilder;
use crate::links::types::{LinkError, NamedFile};

/// Write `files` as a zip at `dest`. The file only appears once complete.
pub(crate) fn write_bundle(dest: &Path, files: &[NamedFile]) -> Result<u64, LinkError> {
    if files.is_empty() {
        return Err(LinkError::Package("nothing to package".into()));
    }

    let mut bundle = ArchiveBuilder::new();
    for file in files {
        validate_name(&file.name)?;
        bundle
            .add_file(&file.name, &file.data)
            .map_err(|e| LinkError::Package(e.to_string()))?;
    }
    let bytes = bundle.finish().map_err(|e| LinkError::Package(e.to_string()))?;

    let dir = dest
        .parent()
        .ok_or_else(|| LinkError::Package(format!("no parent directory for {}", dest.display())))?;
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.persist(dest).map_err(|e| LinkError::Io(e.error))?;
    Ok(bytes.len() as u64)
}

fn validate_name(name: &str) -> Result<(), LinkError> {
    let unsafe_name = name.is_empty()
        || name.starts_with('/')
        || name.contains('\\')
        || name.split('/').any(|part| part == ".." || part.is_empty());
    if unsafe_name {
        return Err(LinkError::Package(format!("invalid file name {name:?}")));
    }
    Ok(())
}
