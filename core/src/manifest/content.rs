//! manifest/content.rs
//! Sealing and opening of the encrypted content manifest.

use crate::crypto::{self, KeyError, PackKey};
use crate::headers::{decode_header, encode_header, ManifestHeader};
use crate::manifest::types::{ContentManifest, ManifestError};

impl ContentManifest {
    /// Header + ciphertext of the JSON index, ready to store as `contents.json`.
    pub fn seal(&self, content_id: &str, master_key: &PackKey) -> Result<Vec<u8>, ManifestError> {
        let header = encode_header(&ManifestHeader::new(content_id))?;
        let json = serde_json::to_vec(self).map_err(|e| ManifestError::Serialize(e.to_string()))?;
        let ciphertext = crypto::encrypt(&json, master_key)?;

        let mut out = Vec::with_capacity(header.len() + ciphertext.len());
        out.extend_from_slice(&header);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Parse the header and decrypt the index.
    ///
    /// Header problems are format errors; anything that goes wrong after the cipher
    /// (bad UTF-8, bad JSON, bad per-entry keys) points at the wrong master key.
    pub fn open(bytes: &[u8], master_key: &PackKey) -> Result<(ManifestHeader, Self), ManifestError> {
        let (header, ciphertext) = decode_header(bytes)?;
        let plaintext = crypto::decrypt(ciphertext, master_key)?;
        let manifest: ContentManifest = serde_json::from_slice(&plaintext)
            .map_err(|e| KeyError::Undecipherable(e.to_string()))?;
        manifest.validate_keys()?;
        Ok((header, manifest))
    }

    pub fn to_pretty_json(&self) -> Result<Vec<u8>, ManifestError> {
        serde_json::to_vec_pretty(self).map_err(|e| ManifestError::Serialize(e.to_string()))
    }

    fn validate_keys(&self) -> Result<(), KeyError> {
        for entry in &self.content {
            if let Some(key) = &entry.key {
                PackKey::parse(key).map_err(|e| {
                    KeyError::Undecipherable(format!("entry {}: {}", entry.path, e))
                })?;
            }
        }
        Ok(())
    }
}
