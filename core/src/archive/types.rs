use bytes::Bytes;
use thiserror::Error;

/// One archive member as seen by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveEntry {
    /// Directory path, always with a trailing `/`.
    Directory(String),
    File { path: String, data: Bytes },
}

impl ArchiveEntry {
    pub fn path(&self) -> &str {
        match self {
            ArchiveEntry::Directory(path) => path,
            ArchiveEntry::File { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive is not readable: {0}")]
    Unreadable(String),

    #[error("unsafe entry path: {0}")]
    UnsafePath(String),

    #[error("archive write failed: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ArchiveError::Io(io),
            other => ArchiveError::Unreadable(other.to_string()),
        }
    }
}
