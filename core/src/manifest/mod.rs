//! Content manifests (`contents.json`) and pack metadata (`manifest.json`).

pub mod types;
pub mod content;
pub mod pack;

pub use types::*;
pub use pack::{read_content_id, strip_json_comments};
