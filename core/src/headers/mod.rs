//! headers/mod.rs
//! Binary header of the encrypted content manifest (`contents.json`).
//!
//! Layout:
//! - 0x00..0x04 version, all zero
//! - 0x04..0x08 magic `FC B9 CF 9B`
//! - 0x08..0x10 reserved
//! - 0x10       content id length N
//! - 0x11..+N   content id (UTF-8)
//! - ..0x100    reserved
//! - 0x100..    manifest ciphertext

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
