//! crypto/types.rs
//! Key type, sizes and key errors.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Length of every pack key, in ASCII characters (= AES-256 key bytes).
pub const KEY_LEN_32: usize = 32;

/// IV length for AES/CFB-8. The IV is the key prefix of this length.
pub const IV_LEN_16: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Key is not exactly 32 characters.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Key contains a character outside `[A-Za-z0-9]`.
    #[error("invalid key character at position {position}")]
    InvalidCharacter { position: usize },

    /// Cipher rejected the key/IV material.
    #[error("cipher fault: {0}")]
    Cipher(String),

    /// Recovered bytes are not the expected plaintext (wrong key or corrupt data).
    #[error("decryption produced unreadable data: {0}")]
    Undecipherable(String),
}

/// A 32-character alphanumeric pack key.
///
/// The ASCII bytes double as the AES-256 key, and their first 16 bytes as the IV.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackKey([u8; KEY_LEN_32]);

impl PackKey {
    /// Validate shape only; no cipher work happens here.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        let bytes = raw.as_bytes();
        if bytes.len() != KEY_LEN_32 {
            return Err(KeyError::InvalidLength {
                expected: KEY_LEN_32,
                actual: raw.chars().count(),
            });
        }
        if let Some(position) = bytes.iter().position(|b| !b.is_ascii_alphanumeric()) {
            return Err(KeyError::InvalidCharacter { position });
        }

        let mut arr = [0u8; KEY_LEN_32];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub(crate) fn from_alphanumeric(bytes: [u8; KEY_LEN_32]) -> Self {
        debug_assert!(bytes.iter().all(u8::is_ascii_alphanumeric));
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN_32] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Constructors only admit ASCII alphanumerics.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// IV derived from the key itself. Weak (the IV repeats for every message under the
    /// same key), but it is what the container format prescribes.
    pub fn iv(&self) -> [u8; IV_LEN_16] {
        let mut iv = [0u8; IV_LEN_16];
        iv.copy_from_slice(&self.0[..IV_LEN_16]);
        iv
    }
}

impl FromStr for PackKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for PackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep secrets out of logs.
        write!(f, "PackKey({}…)", &self.as_str()[..4])
    }
}
