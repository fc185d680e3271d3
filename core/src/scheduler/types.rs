use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::crypto::{KeyError, PackKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOp {
    Encrypt,
    Decrypt,
}

impl fmt::Display for TaskOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOp::Encrypt => f.write_str("encrypt"),
            TaskOp::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// One independent cipher job. Immutable once submitted; the payload is shared, not copied.
#[derive(Debug, Clone)]
pub struct Task {
    pub op: TaskOp,
    pub payload: Bytes,
    pub key: PackKey,
    /// Caller-chosen tag, usually the archive path.
    pub label: String,
}

impl Task {
    pub fn encrypt(label: impl Into<String>, payload: Bytes, key: PackKey) -> Self {
        Self { op: TaskOp::Encrypt, payload, key, label: label.into() }
    }

    pub fn decrypt(label: impl Into<String>, payload: Bytes, key: PackKey) -> Self {
        Self { op: TaskOp::Decrypt, payload, key, label: label.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Cipher(#[from] KeyError),

    #[error("task exceeded {limit:?}")]
    Timeout { limit: Duration },

    #[error("execution unit terminated abnormally: {0}")]
    WorkerFault(String),
}

#[derive(Debug, Clone)]
pub struct TaskResult {
    pub label: String,
    pub outcome: Result<Bytes, TaskError>,
}

impl TaskResult {
    pub fn success(label: String, payload: Bytes) -> Self {
        Self { label, outcome: Ok(payload) }
    }

    pub fn failed(label: String, error: TaskError) -> Self {
        Self { label, outcome: Err(error) }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// Pool could not be started or has been shut down.
    #[error("worker pool unavailable: {0}")]
    Unavailable(String),

    /// Coordinator dropped a reply channel (shutdown while the batch was in flight).
    #[error("worker pool disconnected before replying")]
    Disconnected,

    /// A task of the batch failed; the batch as a whole is rejected.
    #[error("task {label} failed: {source}")]
    Rejected { label: String, source: TaskError },
}

impl SchedulerError {
    /// Whether re-running the batch on the caller thread can succeed.
    /// Cipher errors are deterministic and would fail again.
    pub fn allows_fallback(&self) -> bool {
        match self {
            SchedulerError::Unavailable(_) | SchedulerError::Disconnected => true,
            SchedulerError::Rejected { source, .. } => !matches!(source, TaskError::Cipher(_)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub max_units: usize,
    pub units: usize,
    pub busy: usize,
    pub queued: usize,
    /// Highest number of simultaneously busy units seen so far.
    pub peak_busy: usize,
    pub spawned: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub faulted: u64,
    /// Units retired on timeout whose thread is still running its task.
    pub retired_running: usize,
}
