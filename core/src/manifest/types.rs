use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::KeyError;
use crate::headers::HeaderError;

/// One line of a content manifest. `key == None` marks a verbatim entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    pub key: Option<String>,
}

impl ContentEntry {
    pub fn verbatim(path: impl Into<String>) -> Self {
        Self { path: path.into(), key: None }
    }

    pub fn encrypted(path: impl Into<String>, key: &crate::crypto::PackKey) -> Self {
        Self { path: path.into(), key: Some(key.as_str().to_owned()) }
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }
}

/// Ordered index of one pack or subpack scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentManifest {
    pub content: Vec<ContentEntry>,
}

/// Root `manifest.json` of a pack; only `header.uuid` is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct PackManifest {
    pub header: PackManifestHeader,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackManifestHeader {
    pub uuid: String,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{0} not found")]
    Missing(&'static str),

    #[error("malformed pack manifest: {0}")]
    MalformedPackManifest(String),

    #[error("content manifest header: {0}")]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("content manifest serialization failed: {0}")]
    Serialize(String),
}
