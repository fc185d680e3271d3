//! links/store.rs
//! Single-use, time-limited download links over packaged artifacts.
//!
//! A link resolves successfully at most once. The record is purged on the first
//! resolution after that, at expiry, or once the grace delay after its use has
//! passed; the artifact file goes with it. Resolving schedules that deadline with
//! the reaper, and `shutdown` purges every used link that is still around.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam::channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::LinkStoreConfig;
use crate::links::package::write_bundle;
use crate::links::reaper::{Deadline, Reaper};
use crate::links::types::{to_chrono, DownloadLink, LinkError, LinkId, LinkStats, NamedFile};

/// State shared between the store handle and its reaper thread.
pub(crate) struct Shared {
    records: Mutex<HashMap<LinkId, DownloadLink>>,
    dir: PathBuf,
    ttl: Duration,
    grace: Duration,
}

impl Shared {
    /// Purge every reapable record; returns how many were removed.
    pub(crate) fn sweep(&self, now: DateTime<Utc>) -> usize {
        let purged: Vec<DownloadLink> = {
            let mut records = self.records.lock();
            let ids: Vec<LinkId> = records
                .values()
                .filter(|link| link.is_reapable(now, self.grace))
                .map(|link| link.id)
                .collect();
            ids.iter().filter_map(|id| records.remove(id)).collect()
        };

        for link in &purged {
            remove_artifact(&link.artifact_path);
        }
        purged.len()
    }

    /// Purge `id` if it has been used. Returns whether a record was removed.
    pub(crate) fn purge_used(&self, id: &LinkId) -> bool {
        let removed = {
            let mut records = self.records.lock();
            match records.get(id) {
                Some(link) if link.used => records.remove(id),
                _ => None,
            }
        };
        match removed {
            Some(link) => {
                debug!(link = %id, "grace delay over, purging used link");
                remove_artifact(&link.artifact_path);
                true
            }
            None => false,
        }
    }

    /// Purge every used link regardless of its grace delay.
    fn purge_all_used(&self) -> usize {
        let purged: Vec<DownloadLink> = {
            let mut records = self.records.lock();
            let ids: Vec<LinkId> = records.values().filter(|l| l.used).map(|l| l.id).collect();
            ids.iter().filter_map(|id| records.remove(id)).collect()
        };
        for link in &purged {
            remove_artifact(&link.artifact_path);
        }
        purged.len()
    }
}

pub struct LinkStore {
    shared: Arc<Shared>,
    reaper: Mutex<Option<Reaper>>,
    deadlines: Sender<Deadline>,
}

impl LinkStore {
    /// Create the artifact directory and start the reaper.
    pub fn new(config: &LinkStoreConfig) -> Result<Self, LinkError> {
        let dir = config.artifact_dir();
        fs::create_dir_all(&dir)?;

        let shared = Arc::new(Shared {
            records: Mutex::new(HashMap::new()),
            dir,
            ttl: config.ttl(),
            grace: config.grace(),
        });
        let reaper = Reaper::spawn(Arc::clone(&shared), config.sweep_interval())?;
        let deadlines = reaper.scheduler();

        info!(
            dir = %shared.dir.display(),
            ttl_ms = config.ttl_ms,
            "link store ready"
        );
        Ok(Self { shared, reaper: Mutex::new(Some(reaper)), deadlines })
    }

    pub fn dir(&self) -> &Path {
        &self.shared.dir
    }

    /// Package `files` into one artifact and issue a link to it.
    pub fn create(&self, files: &[NamedFile]) -> Result<LinkId, LinkError> {
        let id = LinkId::new();
        let artifact_path = self.shared.dir.join(format!("{id}.zip"));
        let size = write_bundle(&artifact_path, files)?;

        let created_at = Utc::now();
        let link = DownloadLink {
            id,
            artifact_path,
            created_at,
            expires_at: created_at + to_chrono(self.shared.ttl),
            used: false,
            used_at: None,
        };
        self.shared.records.lock().insert(id, link);

        debug!(link = %id, files = files.len(), bytes = size, "link created");
        Ok(id)
    }

    /// Hand out the artifact path exactly once.
    ///
    /// A used or expired link is purged on sight and reported as not found.
    pub fn resolve(&self, id: &LinkId) -> Result<PathBuf, LinkError> {
        let now = Utc::now();
        let mut records = self.shared.records.lock();
        let link = records.get_mut(id).ok_or(LinkError::NotFound)?;

        if link.used || link.is_expired(now) {
            let stale = records.remove(id);
            drop(records);
            if let Some(stale) = stale {
                debug!(link = %id, used = stale.used, "purging stale link");
                remove_artifact(&stale.artifact_path);
            }
            return Err(LinkError::NotFound);
        }

        link.used = true;
        link.used_at = Some(now);
        let path = link.artifact_path.clone();
        drop(records);

        // An unrepresentable deadline is left to the periodic sweep.
        if let Some(deadline) = Instant::now().checked_add(self.shared.grace) {
            if self.deadlines.send((deadline, *id)).is_err() {
                // Reaper already stopped; `shutdown` or the next `sweep` purges it.
                debug!(link = %id, "reaper stopped, artifact deletion left to sweep");
            }
        }
        debug!(link = %id, grace_ms = self.shared.grace.as_millis() as u64, "link resolved");
        Ok(path)
    }

    /// Parse `raw` and resolve it. Malformed ids are simply not found.
    pub fn resolve_str(&self, raw: &str) -> Result<PathBuf, LinkError> {
        let id: LinkId = raw.parse()?;
        self.resolve(&id)
    }

    pub fn stats(&self) -> LinkStats {
        let now = Utc::now();
        let records = self.shared.records.lock();
        let expired = records.values().filter(|l| l.is_expired(now)).count();
        let active = records
            .values()
            .filter(|l| !l.used && !l.is_expired(now))
            .count();
        LinkStats { total: records.len(), active, expired }
    }

    /// Run one sweep now instead of waiting for the reaper.
    pub fn sweep(&self) -> usize {
        self.shared.sweep(Utc::now())
    }

    /// Stop the reaper and purge every used link now, grace or not. Idempotent.
    ///
    /// Unused links stay until they expire; `sweep` still works afterwards.
    pub fn shutdown(&self) {
        if let Some(mut reaper) = self.reaper.lock().take() {
            reaper.stop();
            info!("link store stopped");
        }
        // Also catches links resolved after an earlier shutdown.
        let purged = self.shared.purge_all_used();
        if purged > 0 {
            debug!(purged, "used links purged at shutdown");
        }
    }
}

impl Drop for LinkStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn remove_artifact(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "artifact deleted"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot delete artifact"),
    }
}
