//! scheduler/policy.rs
//! Pool sizing.

use serde::{Deserialize, Serialize};

use crate::constants::{CONSTRAINED_UNIT_CEILING, UNCONSTRAINED_UNIT_CAP};

/// Deployment profile for the execution-unit cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    /// Shared/production hosts: cores - 1, capped at a small ceiling.
    #[default]
    Constrained,
    /// Dedicated hosts: fixed, larger cap.
    Unconstrained,
}

impl std::str::FromStr for PoolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constrained" | "production" => Ok(PoolMode::Constrained),
            "unconstrained" | "development" => Ok(PoolMode::Unconstrained),
            other => Err(format!("unknown pool mode {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub max_units: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self { max_units: 1 }
    }

    /// Size from the host's logical core count.
    pub fn dynamic(mode: PoolMode) -> Self {
        Self { max_units: max_units_for(mode, num_cpus::get()) }
    }

    pub fn fixed(max_units: usize) -> Self {
        Self { max_units: max_units.max(1) }
    }
}

/// Unit cap for `mode` on a host with `cores` logical cores. Never zero.
pub fn max_units_for(mode: PoolMode, cores: usize) -> usize {
    match mode {
        PoolMode::Constrained => cores.saturating_sub(1).clamp(1, CONSTRAINED_UNIT_CEILING),
        PoolMode::Unconstrained => UNCONSTRAINED_UNIT_CAP,
    }
}
