//! headers/types.rs
//! Content manifest header and its errors.
//!
//! Notes:
//! - The header is 256 bytes, fixed length; ciphertext always starts at 0x100.
//! - Version (4 zero bytes) and magic are stored as raw bytes, no endianness involved.
//! - Reserved ranges must be zero on write and are ignored on read.

use thiserror::Error;

use crate::constants::{MANIFEST_HEADER_LEN, MANIFEST_MAGIC, MANIFEST_VERSION, MAX_CONTENT_ID_LEN};

/// Fixed header size in bytes.
pub const HEADER_LEN: usize = MANIFEST_HEADER_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHeader {
    pub version: [u8; 4], // 0x00..0x04, all zero
    pub magic: [u8; 4],   // 0x04..0x08
    pub content_id: String,
}

impl ManifestHeader {
    pub const LEN: usize = HEADER_LEN;

    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            magic: MANIFEST_MAGIC,
            content_id: content_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.version != MANIFEST_VERSION {
            return Err(HeaderError::UnsupportedVersion { have: self.version });
        }
        if self.magic != MANIFEST_MAGIC {
            return Err(HeaderError::InvalidMagic {
                have: self.magic,
                need: MANIFEST_MAGIC,
            });
        }
        if self.content_id.is_empty() {
            return Err(HeaderError::EmptyContentId);
        }
        if self.content_id.len() > MAX_CONTENT_ID_LEN {
            return Err(HeaderError::ContentIdTooLong {
                have: self.content_id.len(),
                max: MAX_CONTENT_ID_LEN,
            });
        }
        Ok(())
    }
}

pub fn fmt_bytes(b: &[u8]) -> String {
    if b.iter().all(|&c| c.is_ascii_graphic() || c == b' ') {
        format!("b\"{}\"", String::from_utf8_lossy(b))
    } else {
        format!("0x{}", hex::encode(b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Buffer too short to contain a header.
    #[error("header buffer too short: {have} < {need}")]
    BufferTooShort { have: usize, need: usize },

    #[error("invalid magic: expected {}, got {}", fmt_bytes(.need), fmt_bytes(.have))]
    InvalidMagic { have: [u8; 4], need: [u8; 4] },

    #[error("unsupported version: {}", fmt_bytes(.have))]
    UnsupportedVersion { have: [u8; 4] },

    #[error("content id is empty")]
    EmptyContentId,

    /// The one-byte prefix plus the fixed header size bound the identifier.
    #[error("content id too long: {have} > {max} bytes")]
    ContentIdTooLong { have: usize, max: usize },

    #[error("content id is not valid UTF-8")]
    ContentIdNotUtf8,
}
