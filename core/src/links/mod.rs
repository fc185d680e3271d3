//! Ephemeral download links: package an artifact, hand it out once, then delete it.

pub mod types;
mod package;
pub mod store;
mod reaper;

pub use types::{DownloadLink, LinkError, LinkId, LinkStats, NamedFile};
pub use store::LinkStore;
