//! config.rs
//! Engine configuration. Every field has a default, so `{}` is a valid config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_LINK_GRACE, DEFAULT_LINK_TTL, DEFAULT_SWEEP_INTERVAL, DEFAULT_TASK_TIMEOUT,
};
use crate::scheduler::policy::{ParallelismProfile, PoolMode};

/// Environment variable overriding `pool.mode`.
pub const ENV_POOL_MODE: &str = "PACKGUARD_POOL_MODE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// `false` runs every batch on the caller thread.
    pub parallel: bool,
    pub mode: PoolMode,
    /// Explicit unit cap; overrides `mode` sizing.
    pub max_units: Option<usize>,
    pub task_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            mode: PoolMode::default(),
            max_units: None,
            task_timeout_ms: DEFAULT_TASK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl PoolConfig {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn profile(&self) -> ParallelismProfile {
        match self.max_units {
            Some(n) => ParallelismProfile::fixed(n),
            None => ParallelismProfile::dynamic(self.mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkStoreConfig {
    /// Artifact directory; a `packguard-links` folder under the system temp dir if unset.
    pub dir: Option<PathBuf>,
    pub ttl_ms: u64,
    pub grace_ms: u64,
    pub sweep_interval_ms: u64,
}

impl Default for LinkStoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_ms: DEFAULT_LINK_TTL.as_millis() as u64,
            grace_ms: DEFAULT_LINK_GRACE.as_millis() as u64,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        }
    }
}

impl LinkStoreConfig {
    pub fn artifact_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("packguard-links"))
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pool: PoolConfig,
    pub links: LinkStoreConfig,
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply `PACKGUARD_POOL_MODE` if set.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(raw) = std::env::var(ENV_POOL_MODE) {
            self.pool.mode = raw.parse().map_err(ConfigError::Invalid)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.task_timeout_ms == 0 {
            return Err(ConfigError::Invalid("pool.task_timeout_ms must be > 0".into()));
        }
        if self.pool.max_units == Some(0) {
            return Err(ConfigError::Invalid("pool.max_units must be > 0".into()));
        }
        if self.links.ttl_ms == 0 {
            return Err(ConfigError::Invalid("links.ttl_ms must be > 0".into()));
        }
        if self.links.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid("links.sweep_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}
