//! codec/mod.rs
//! Pack container codec.
//!
//! Output layout of an encoded pack:
//! - every directory of the source, as an empty directory entry
//! - excluded files (`manifest.json`, pack icons) byte-for-byte
//! - every other file, AES-256/CFB-8 under its own random key
//! - `contents.json` at the root and at each `subpacks/<name>/`, listing the scope's
//!   entries and their keys, sealed under the master key

pub mod types;
pub mod policy;
pub mod encode;
pub mod decode;
pub mod io;

pub use types::*;
pub use policy::{is_excluded, split_scope, subpack_root};
pub use encode::encode_pack;
pub use decode::decode_pack;
pub use io::{decode_pack_file, encode_pack_file};
