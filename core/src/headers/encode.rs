//! headers/encode.rs
//!
//! Serializes a `ManifestHeader` into its fixed 256-byte form.
//! Field order must match `decode.rs`.

use crate::constants::{CONTENT_ID_LEN_OFFSET, CONTENT_ID_OFFSET};
use crate::headers::types::{HeaderError, ManifestHeader, HEADER_LEN};

/// Validate and serialize the header.
///
/// Over-long content ids are rejected, never truncated.
pub fn encode_header(h: &ManifestHeader) -> Result<[u8; HEADER_LEN], HeaderError> {
    h.validate()?;

    let mut out = [0u8; HEADER_LEN];
    let id = h.content_id.as_bytes();

    out[0x00..0x04].copy_from_slice(&h.version); // version
    out[0x04..0x08].copy_from_slice(&h.magic);   // magic
    // 0x08..0x10 reserved, zero
    out[CONTENT_ID_LEN_OFFSET] = id.len() as u8; // validate() bounds this below 256
    out[CONTENT_ID_OFFSET..CONTENT_ID_OFFSET + id.len()].copy_from_slice(id);
    // rest reserved, zero

    Ok(out)
}
