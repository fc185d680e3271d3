//! context.rs
//! `PackEngine`: the one object a host process builds to use the crate.
//!
//! It owns the worker pool and the link store for its whole lifetime and tears both
//! down in `shutdown` (or on drop). Nothing here is global.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::codec::{self, DecodeOptions, DecodedPack, EncodedPack};
use crate::config::EngineConfig;
use crate::crypto::PackKey;
use crate::links::{LinkId, LinkStats, LinkStore, NamedFile};
use crate::scheduler::{PoolStats, WorkerPool};
use crate::telemetry::{NoProgress, ProgressSink};
use crate::types::PackError;

pub struct PackEngine {
    config: EngineConfig,
    pool: Option<WorkerPool>,
    links: LinkStore,
}

impl PackEngine {
    /// Build the engine. A pool that cannot start is logged and replaced by
    /// sequential execution; a link store that cannot start is an error.
    pub fn new(config: EngineConfig) -> Result<Self, PackError> {
        config.validate()?;

        let pool = if config.pool.parallel {
            match WorkerPool::new(&config.pool) {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "worker pool unavailable, running sequentially");
                    None
                }
            }
        } else {
            None
        };
        let links = LinkStore::new(&config.links)?;

        info!(
            parallel = pool.is_some(),
            max_units = pool.as_ref().map(WorkerPool::max_units).unwrap_or(1),
            "pack engine started"
        );
        Ok(Self { config, pool, links })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn encode_pack(&self, archive: &[u8], key: Option<PackKey>) -> Result<EncodedPack, PackError> {
        self.encode_pack_with_progress(archive, key, &NoProgress)
    }

    pub fn encode_pack_with_progress(
        &self,
        archive: &[u8],
        key: Option<PackKey>,
        progress: &dyn ProgressSink,
    ) -> Result<EncodedPack, PackError> {
        codec::encode_pack(archive, key, self.pool.as_ref(), progress)
    }

    pub fn decode_pack(
        &self,
        archive: &[u8],
        key: &str,
        options: DecodeOptions,
    ) -> Result<DecodedPack, PackError> {
        self.decode_pack_with_progress(archive, key, options, &NoProgress)
    }

    pub fn decode_pack_with_progress(
        &self,
        archive: &[u8],
        key: &str,
        options: DecodeOptions,
        progress: &dyn ProgressSink,
    ) -> Result<DecodedPack, PackError> {
        codec::decode_pack(archive, key, options, self.pool.as_ref(), progress)
    }

    pub fn encode_pack_file(
        &self,
        src: &Path,
        dst: &Path,
        key: Option<PackKey>,
        progress: &dyn ProgressSink,
    ) -> Result<EncodedPack, PackError> {
        codec::encode_pack_file(src, dst, key, self.pool.as_ref(), progress)
    }

    pub fn decode_pack_file(
        &self,
        src: &Path,
        dst: &Path,
        key: &str,
        options: DecodeOptions,
        progress: &dyn ProgressSink,
    ) -> Result<DecodedPack, PackError> {
        codec::decode_pack_file(src, dst, key, options, self.pool.as_ref(), progress)
    }

    pub fn create_link(&self, files: &[NamedFile]) -> Result<LinkId, PackError> {
        Ok(self.links.create(files)?)
    }

    pub fn resolve_link(&self, id: &str) -> Result<PathBuf, PackError> {
        Ok(self.links.resolve_str(id)?)
    }

    pub fn link_stats(&self) -> LinkStats {
        self.links.stats()
    }

    /// `None` when running without a pool.
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().and_then(|pool| pool.stats().ok())
    }

    /// Stop the pool and the reaper, deleting artifacts of used links. Later codec calls
    /// run sequentially.
    pub fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.shutdown();
        }
        self.links.shutdown();
        info!("pack engine stopped");
    }
}

impl Drop for PackEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
