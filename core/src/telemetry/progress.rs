//! telemetry/progress.rs
//! Optional, non-blocking progress reporting.

use crossbeam::channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::telemetry::timers::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: String,
    /// 0..=100
    pub percent: u8,
}

impl ProgressUpdate {
    pub fn new(stage: Stage, percent: u8) -> Self {
        Self { stage: stage.as_str().to_owned(), percent: percent.min(100) }
    }
}

/// Receives progress updates. Implementations must not block the caller.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Updates are dropped when the channel is full or the receiver is gone.
impl ProgressSink for Sender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        if let Err(TrySendError::Disconnected(_)) = self.try_send(update) {
            tracing::trace!("progress receiver dropped");
        }
    }
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// `percent` of `done` out of `total`, linearly mapped into `[from, to]`.
pub(crate) fn scaled_percent(done: usize, total: usize, from: u8, to: u8) -> u8 {
    if total == 0 {
        return to;
    }
    let span = (to.saturating_sub(from)) as usize;
    from + ((done.min(total) * span) / total) as u8
}
