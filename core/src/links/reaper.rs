//! links/reaper.rs
//! Background purge of used and expired links.
//!
//! Two triggers share one thread: a per-link deadline (`schedule`, set when a link is
//! resolved) and a periodic sweep for everything else.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam::channel::{at, bounded, never, select, tick, unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::links::store::Shared;
use crate::links::types::LinkId;

/// Purge request: drop `LinkId` once `Instant` has passed.
pub(crate) type Deadline = (Instant, LinkId);

pub(crate) struct Reaper {
    stop: Option<Sender<()>>,
    schedule: Sender<Deadline>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    pub(crate) fn spawn(shared: Arc<Shared>, interval: Duration) -> io::Result<Self> {
        let (stop, stop_rx) = bounded::<()>(0);
        let (schedule, schedule_rx) = unbounded::<Deadline>();
        let handle = thread::Builder::new()
            .name("link-reaper".into())
            .spawn(move || reap(&shared, interval, stop_rx, schedule_rx))?;

        Ok(Self { stop: Some(stop), schedule, handle: Some(handle) })
    }

    /// Sender for purge deadlines. Sends fail quietly once the reaper stopped.
    pub(crate) fn scheduler(&self) -> Sender<Deadline> {
        self.schedule.clone()
    }

    /// Signal the thread and wait for it. Idempotent.
    pub(crate) fn stop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("link reaper panicked");
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reap(shared: &Shared, interval: Duration, stop: Receiver<()>, schedule: Receiver<Deadline>) {
    let ticker = tick(interval);
    // Min-heap on the deadline.
    let mut pending: BinaryHeap<Reverse<Deadline>> = BinaryHeap::new();
    let mut running = true;

    while running {
        let due = match pending.peek() {
            Some(Reverse((when, _))) => at(*when),
            None => never(),
        };
        select! {
            // Message or disconnect both mean stop.
            recv(stop) -> _ => running = false,
            recv(schedule) -> msg => match msg {
                Ok(deadline) => pending.push(Reverse(deadline)),
                Err(_) => running = false,
            },
            recv(due) -> _ => {
                let now = Instant::now();
                while pending.peek().is_some_and(|Reverse((when, _))| *when <= now) {
                    if let Some(Reverse((_, id))) = pending.pop() {
                        shared.purge_used(&id);
                    }
                }
            },
            recv(ticker) -> _ => {
                let purged = shared.sweep(Utc::now());
                if purged > 0 {
                    debug!(purged, "reaper swept links");
                }
            },
        }
    }
    debug!(pending = pending.len(), "link reaper stopped");
}
