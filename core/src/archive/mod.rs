//! Zip archive adapter: enumerate entries, read entry bytes, add entries/directories,
//! finalize to bytes.

pub mod types;
pub mod reader;
pub mod writer;

pub use types::{ArchiveEntry, ArchiveError};
pub use reader::read_archive;
pub use writer::ArchiveBuilder;
