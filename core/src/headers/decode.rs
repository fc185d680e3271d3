//! headers/decode.rs
//!
//! Parses the fixed 256-byte header that precedes the manifest ciphertext.

use crate::constants::{CONTENT_ID_LEN_OFFSET, CONTENT_ID_OFFSET};
use crate::headers::types::{HeaderError, ManifestHeader, HEADER_LEN};

/// Decode a header from the start of `buf` and return it with the remaining ciphertext.
pub fn decode_header(buf: &[u8]) -> Result<(ManifestHeader, &[u8]), HeaderError> {
    if buf.len() < HEADER_LEN {
        return Err(HeaderError::BufferTooShort { have: buf.len(), need: HEADER_LEN });
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&buf[0x00..0x04]);
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&buf[0x04..0x08]);

    let id_len = buf[CONTENT_ID_LEN_OFFSET] as usize;
    let id_end = CONTENT_ID_OFFSET + id_len;
    if id_end > HEADER_LEN {
        return Err(HeaderError::ContentIdTooLong {
            have: id_len,
            max: HEADER_LEN - CONTENT_ID_OFFSET,
        });
    }
    let content_id = std::str::from_utf8(&buf[CONTENT_ID_OFFSET..id_end])
        .map_err(|_| HeaderError::ContentIdNotUtf8)?
        .to_owned();

    let header = ManifestHeader { version, magic, content_id };
    header.validate()?;

    Ok((header, &buf[HEADER_LEN..]))
}
