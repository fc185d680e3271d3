//! packguard-core
//!
//! Selective encryption of content packs, a bounded parallel cipher scheduler and
//! single-use download links. Pure Rust, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

// Format layers
pub mod crypto;
pub mod headers;
pub mod manifest;
pub mod archive;
pub mod telemetry;

// Execution
pub mod scheduler;
pub mod codec;
pub mod links;

pub mod context;

// -----------------------------------------------------------------------------
// Prelude
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::codec::{decode_pack, encode_pack, DecodeOptions, DecodedPack, EncodedPack};
    pub use crate::config::EngineConfig;
    pub use crate::context::PackEngine;
    pub use crate::crypto::{generate_key, KeyError, PackKey};
    pub use crate::links::{LinkId, NamedFile};
    pub use crate::telemetry::{NoProgress, ProgressSink, ProgressUpdate};
    pub use crate::types::PackError;
}
