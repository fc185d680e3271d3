//! crypto/cipher.rs
//! AES-256 in CFB-8 mode, keyed by a `PackKey`.
//!
//! Design notes:
//! - Key = the 32 ASCII key bytes, IV = the first 16 of them.
//! - CFB-8 is a self-synchronising stream mode: ciphertext length == plaintext length,
//!   no padding, no tag. A wrong key is only noticed when the plaintext is parsed.
//! - The IV repeats for every message sealed under one key. Per-entry keys are fresh,
//!   so only the manifest master key is ever reused across messages.

use aes::Aes256;
use cfb8::cipher::{AsyncStreamCipher, KeyIvInit};

use crate::crypto::types::{KeyError, PackKey};

type Aes256Cfb8Enc = cfb8::Encryptor<Aes256>;
type Aes256Cfb8Dec = cfb8::Decryptor<Aes256>;

/// Encrypt `data` under `key`, returning a new buffer of the same length.
pub fn encrypt(data: &[u8], key: &PackKey) -> Result<Vec<u8>, KeyError> {
    let mut buf = data.to_vec();
    encrypt_in_place(&mut buf, key)?;
    Ok(buf)
}

/// Decrypt `data` under `key`, returning a new buffer of the same length.
pub fn decrypt(data: &[u8], key: &PackKey) -> Result<Vec<u8>, KeyError> {
    let mut buf = data.to_vec();
    decrypt_in_place(&mut buf, key)?;
    Ok(buf)
}

pub fn encrypt_in_place(buf: &mut [u8], key: &PackKey) -> Result<(), KeyError> {
    let iv = key.iv();
    Aes256Cfb8Enc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| KeyError::Cipher(e.to_string()))?
        .encrypt(buf);
    Ok(())
}

pub fn decrypt_in_place(buf: &mut [u8], key: &PackKey) -> Result<(), KeyError> {
    let iv = key.iv();
    Aes256Cfb8Dec::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| KeyError::Cipher(e.to_string()))?
        .decrypt(buf);
    Ok(())
}
