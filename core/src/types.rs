use std::io;

use thiserror::Error;

use crate::{
    archive::ArchiveError,
    config::ConfigError,
    crypto::KeyError,
    headers::HeaderError,
    links::LinkError,
    manifest::ManifestError,
    scheduler::{SchedulerError, TaskError},
};

/// Unified error of every collaborator-facing operation.
/// - `From<T>` impls for each module error so `?` works across layers.
/// - Module errors are mapped onto the public taxonomy: malformed input is `Format`,
///   anything the master or an entry key cannot open is `Key`.
#[derive(Debug, Error)]
pub enum PackError {
    /// Malformed container: bad header, missing `contents.json`, unreadable archive.
    #[error("format error: {0}")]
    Format(String),

    /// Key shape rejected, or ciphertext does not open under the supplied key.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// A manifest entry names a path that is not in the archive.
    #[error("missing entry: {path}")]
    MissingEntry { path: String },

    /// A cipher task exceeded its time budget and no fallback was possible.
    #[error("task {label} timed out")]
    Timeout { label: String },

    #[error("worker fault: {0}")]
    WorkerFault(String),

    #[error("archive error: {0}")]
    Archive(ArchiveError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PackError {
    pub fn is_key_error(&self) -> bool {
        matches!(self, PackError::Key(_))
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self, PackError::Format(_))
    }
}

impl From<HeaderError> for PackError {
    fn from(e: HeaderError) -> Self {
        PackError::Format(e.to_string())
    }
}

impl From<ManifestError> for PackError {
    fn from(e: ManifestError) -> Self {
        match e {
            ManifestError::Key(k) => PackError::Key(k),
            other => PackError::Format(other.to_string()),
        }
    }
}

impl From<ArchiveError> for PackError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Unreadable(_) | ArchiveError::UnsafePath(_) => {
                PackError::Format(e.to_string())
            }
            ArchiveError::Io(io) => PackError::Io(io),
            other => PackError::Archive(other),
        }
    }
}

impl From<SchedulerError> for PackError {
    fn from(e: SchedulerError) -> Self {
        match e {
            SchedulerError::Rejected { label, source } => match source {
                TaskError::Cipher(k) => PackError::Key(k),
                TaskError::Timeout { .. } => PackError::Timeout { label },
                TaskError::WorkerFault(reason) => PackError::WorkerFault(reason),
            },
            other => PackError::WorkerFault(other.to_string()),
        }
    }
}
