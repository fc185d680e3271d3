//! scheduler/unit.rs
//! One execution unit: a named OS thread with a private job channel.
//!
//! Units share nothing with the coordinator except the messages they exchange:
//! a `Task` in, a `UnitEvent` out. A panic inside the executor ends the unit and is
//! reported as a fault; the coordinator removes it from its registry.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use bytes::Bytes;
use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, error};

use crate::scheduler::types::{Task, TaskError, TaskResult};

pub(crate) type UnitId = u64;

/// Function a unit applies to every task it receives.
pub(crate) type Executor = fn(&Task) -> Result<Bytes, TaskError>;

#[derive(Debug)]
pub(crate) enum UnitEvent {
    Finished { unit: UnitId, result: TaskResult },
    Faulted { unit: UnitId, reason: String },
}

pub(crate) struct UnitHandle {
    pub id: UnitId,
    pub jobs: Sender<Task>,
}

/// Start a unit thread. Dropping the returned handle lets the thread exit once idle.
pub(crate) fn spawn_unit(
    id: UnitId,
    events: Sender<UnitEvent>,
    executor: Executor,
) -> io::Result<UnitHandle> {
    // Capacity 1: a unit only ever holds the task it is assigned.
    let (jobs, rx) = bounded::<Task>(1);
    thread::Builder::new()
        .name(format!("pack-unit-{id}"))
        .spawn(move || unit_loop(id, rx, events, executor))?;
    Ok(UnitHandle { id, jobs })
}

fn unit_loop(id: UnitId, rx: Receiver<Task>, events: Sender<UnitEvent>, executor: Executor) {
    debug!(unit = id, "execution unit started");

    while let Ok(task) = rx.recv() {
        let label = task.label.clone();
        match panic::catch_unwind(AssertUnwindSafe(|| executor(&task))) {
            Ok(outcome) => {
                let result = TaskResult { label, outcome };
                if events.send(UnitEvent::Finished { unit: id, result }).is_err() {
                    return;
                }
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(unit = id, label = %label, %reason, "execution unit panicked");
                let _ = events.send(UnitEvent::Faulted { unit: id, reason });
                return;
            }
        }
    }

    debug!(unit = id, "execution unit stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
