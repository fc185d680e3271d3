//! crypto/keygen.rs
//! Random pack key generation.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::crypto::types::{PackKey, KEY_LEN_32};

/// Uniformly random 32-character `[A-Za-z0-9]` key from the thread-local CSPRNG.
pub fn generate_key() -> PackKey {
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; KEY_LEN_32];
    for b in bytes.iter_mut() {
        *b = rng.sample(Alphanumeric);
    }
    PackKey::from_alphanumeric(bytes)
}
