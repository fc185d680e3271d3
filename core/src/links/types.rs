use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Opaque, unguessable link identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for LinkId {
    type Err = LinkError;

    /// Anything that is not a well-formed id cannot name a link.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self).map_err(|_| LinkError::NotFound)
    }
}

/// Metadata of one issued link.
#[derive(Debug, Clone)]
pub struct DownloadLink {
    pub id: LinkId,
    pub artifact_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

impl DownloadLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Expired, or used and past the grace delay.
    pub fn is_reapable(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        if self.is_expired(now) {
            return true;
        }
        match self.used_at {
            Some(used_at) => now >= used_at + to_chrono(grace),
            None => false,
        }
    }
}

/// One file to bundle into a link artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFile {
    pub name: String,
    pub data: Bytes,
}

impl NamedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self { name: name.into(), data: data.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub total: usize,
    /// Unused and not expired.
    pub active: usize,
    pub expired: usize,
}

#[derive(Debug, Error)]
pub enum LinkError {
    /// Unknown, already used or expired. Deliberately indistinguishable.
    #[error("link not found")]
    NotFound,

    #[error("cannot package artifact: {0}")]
    Package(String),

    #[error("link store I/O: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or_else(|_| chrono::Duration::days(365 * 100))
}
