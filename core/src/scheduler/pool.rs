//! scheduler/pool.rs
//! Bounded pool of execution units driven by a single coordinator thread.
//!
//! The coordinator owns the unit registry and the FIFO queue; nothing else touches them.
//! Callers talk to it through `Command`s and block on a private reply channel per task.
//!
//! Unit lifecycle: `Idle -> Busy -> Idle` on completion, `Idle|Busy -> removed` on panic,
//! dead channel or timeout. Units are spawned lazily, up to `max_units`.
//!
//! OS threads cannot be cancelled. A unit retired on timeout keeps running its task and
//! exits once it finishes; its slot is freed at once, so while such units are alive more
//! than `max_units` threads may be executing. `PoolStats::retired_running` counts them.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, select, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::scheduler::sequential::execute_task;
use crate::scheduler::types::{PoolStats, SchedulerError, Task, TaskError, TaskResult};
use crate::scheduler::unit::{spawn_unit, Executor, UnitEvent, UnitHandle, UnitId};

/// Coordinator wake-up period when no task has a pending deadline.
const IDLE_WAIT: Duration = Duration::from_millis(500);

enum Command {
    Submit { task: Task, reply: Sender<TaskResult> },
    Stats { reply: Sender<PoolStats> },
    Shutdown,
}

pub struct WorkerPool {
    commands: Sender<Command>,
    coordinator: Mutex<Option<JoinHandle<()>>>,
    max_units: usize,
    task_timeout: Duration,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Result<Self, SchedulerError> {
        let profile = config.profile();
        Self::with_executor(profile.max_units, config.task_timeout(), execute_task)
    }

    pub(crate) fn with_executor(
        max_units: usize,
        task_timeout: Duration,
        executor: Executor,
    ) -> Result<Self, SchedulerError> {
        let max_units = max_units.max(1);
        let (commands, command_rx) = unbounded::<Command>();
        let (events_tx, events_rx) = unbounded::<UnitEvent>();

        let coordinator = Coordinator::new(max_units, task_timeout, executor, events_tx);
        let handle = thread::Builder::new()
            .name("pack-scheduler".into())
            .spawn(move || coordinator.run(command_rx, events_rx))
            .map_err(|e| SchedulerError::Unavailable(e.to_string()))?;

        info!(max_units, timeout_ms = task_timeout.as_millis() as u64, "worker pool started");

        Ok(Self {
            commands,
            coordinator: Mutex::new(Some(handle)),
            max_units,
            task_timeout,
        })
    }

    pub fn max_units(&self) -> usize {
        self.max_units
    }

    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    /// Run one task and wait for its result.
    pub fn submit(&self, task: Task) -> Result<TaskResult, SchedulerError> {
        let rx = self.enqueue(task)?;
        rx.recv().map_err(|_| SchedulerError::Disconnected)
    }

    /// Fan out `tasks`, then join them in submission order.
    ///
    /// Any failed task rejects the whole batch; there is no partial success.
    pub fn submit_batch(&self, tasks: Vec<Task>) -> Result<Vec<TaskResult>, SchedulerError> {
        let receivers = tasks
            .into_iter()
            .map(|task| self.enqueue(task))
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = Vec::with_capacity(receivers.len());
        for rx in receivers {
            let result = rx.recv().map_err(|_| SchedulerError::Disconnected)?;
            if let Err(source) = &result.outcome {
                return Err(SchedulerError::Rejected {
                    label: result.label.clone(),
                    source: source.clone(),
                });
            }
            results.push(result);
        }
        Ok(results)
    }

    pub fn stats(&self) -> Result<PoolStats, SchedulerError> {
        let (reply, rx) = bounded(1);
        self.commands
            .send(Command::Stats { reply })
            .map_err(|_| SchedulerError::Unavailable("pool is shut down".into()))?;
        rx.recv().map_err(|_| SchedulerError::Disconnected)
    }

    /// Stop the coordinator and release idle units. Idempotent.
    ///
    /// Units still working on a task finish it and exit; their results are discarded.
    pub fn shutdown(&self) {
        let Some(handle) = self.coordinator.lock().take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if handle.join().is_err() {
            warn!("scheduler coordinator panicked");
        }
        info!("worker pool stopped");
    }

    fn enqueue(&self, task: Task) -> Result<Receiver<TaskResult>, SchedulerError> {
        let (reply, rx) = bounded(1);
        self.commands
            .send(Command::Submit { task, reply })
            .map_err(|_| SchedulerError::Unavailable("pool is shut down".into()))?;
        Ok(rx)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================
// Coordinator
// ============================================================

struct Pending {
    task: Task,
    reply: Sender<TaskResult>,
}

struct InFlight {
    label: String,
    reply: Sender<TaskResult>,
    started: Instant,
}

enum UnitState {
    Idle,
    Busy(InFlight),
}

struct Unit {
    handle: UnitHandle,
    state: UnitState,
}

struct Coordinator {
    max_units: usize,
    task_timeout: Duration,
    executor: Executor,
    events_tx: Sender<UnitEvent>,
    // Ordered so the lowest idle id is reused first.
    units: BTreeMap<UnitId, Unit>,
    // Timed-out units whose thread has not reported back yet.
    retired: HashSet<UnitId>,
    queue: VecDeque<Pending>,
    next_unit_id: UnitId,
    stats: PoolStats,
}

impl Coordinator {
    fn new(
        max_units: usize,
        task_timeout: Duration,
        executor: Executor,
        events_tx: Sender<UnitEvent>,
    ) -> Self {
        Self {
            max_units,
            task_timeout,
            executor,
            events_tx,
            units: BTreeMap::new(),
            retired: HashSet::new(),
            queue: VecDeque::new(),
            next_unit_id: 0,
            stats: PoolStats { max_units, ..PoolStats::default() },
        }
    }

    fn run(mut self, commands: Receiver<Command>, events: Receiver<UnitEvent>) {
        let mut running = true;
        while running {
            let wait = self.next_wait();
            select! {
                recv(commands) -> cmd => match cmd {
                    Ok(Command::Submit { task, reply }) => {
                        self.queue.push_back(Pending { task, reply });
                    }
                    Ok(Command::Stats { reply }) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Ok(Command::Shutdown) | Err(_) => running = false,
                },
                recv(events) -> event => {
                    if let Ok(event) = event {
                        self.on_event(event);
                    }
                },
                default(wait) => {}
            }
            if !running {
                break;
            }
            self.expire_overdue();
            self.dispatch();
        }

        debug!(
            queued = self.queue.len(),
            units = self.units.len(),
            "coordinator exiting, dropping pending work"
        );
    }

    /// Time until the earliest running task hits its deadline.
    fn next_wait(&self) -> Duration {
        let now = Instant::now();
        self.units
            .values()
            .filter_map(|unit| match &unit.state {
                UnitState::Busy(job) => {
                    Some((job.started + self.task_timeout).saturating_duration_since(now))
                }
                UnitState::Idle => None,
            })
            .min()
            .unwrap_or(IDLE_WAIT)
    }

    fn on_event(&mut self, event: UnitEvent) {
        match event {
            UnitEvent::Finished { unit, result } => {
                let Some(entry) = self.units.get_mut(&unit) else {
                    // Unit was retired after a timeout; its late result is dropped.
                    self.retired.remove(&unit);
                    debug!(unit, label = %result.label, "discarding result from retired unit");
                    return;
                };
                if let UnitState::Busy(job) = std::mem::replace(&mut entry.state, UnitState::Idle) {
                    self.stats.completed += 1;
                    let _ = job.reply.send(result);
                }
            }
            UnitEvent::Faulted { unit, reason } => {
                let Some(entry) = self.units.remove(&unit) else {
                    self.retired.remove(&unit);
                    return;
                };
                self.stats.faulted += 1;
                warn!(unit, %reason, "execution unit removed after fault");
                if let UnitState::Busy(job) = entry.state {
                    let _ = job
                        .reply
                        .send(TaskResult::failed(job.label, TaskError::WorkerFault(reason)));
                }
            }
        }
    }

    /// Fail tasks past their deadline and retire the units running them.
    fn expire_overdue(&mut self) {
        let now = Instant::now();
        let overdue: Vec<UnitId> = self
            .units
            .iter()
            .filter_map(|(id, unit)| match &unit.state {
                UnitState::Busy(job) if now.duration_since(job.started) >= self.task_timeout => {
                    Some(*id)
                }
                _ => None,
            })
            .collect();

        for id in overdue {
            let Some(unit) = self.units.remove(&id) else {
                continue;
            };
            if let UnitState::Busy(job) = unit.state {
                self.stats.timed_out += 1;
                self.retired.insert(id);
                warn!(
                    unit = id,
                    label = %job.label,
                    limit_ms = self.task_timeout.as_millis() as u64,
                    "task timed out, retiring unit"
                );
                let limit = self.task_timeout;
                let _ = job
                    .reply
                    .send(TaskResult::failed(job.label, TaskError::Timeout { limit }));
            }
        }
    }

    /// Hand queued tasks to idle units, growing the pool up to its cap.
    fn dispatch(&mut self) {
        while let Some(pending) = self.queue.pop_front() {
            let unit_id = match self.idle_unit() {
                Some(id) => id,
                None if self.units.len() < self.max_units => match self.spawn() {
                    Ok(id) => id,
                    Err(e) if self.units.is_empty() => {
                        // Nothing will ever pick this task up; fail it so the caller can fall back.
                        warn!(error = %e, "cannot spawn execution unit");
                        let label = pending.task.label;
                        let _ = pending.reply.send(TaskResult::failed(
                            label,
                            TaskError::WorkerFault(format!("cannot spawn execution unit: {e}")),
                        ));
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "cannot grow pool, task waits");
                        self.queue.push_front(pending);
                        break;
                    }
                },
                None => {
                    self.queue.push_front(pending);
                    break;
                }
            };

            let Some(unit) = self.units.get_mut(&unit_id) else {
                self.queue.push_front(pending);
                break;
            };

            let label = pending.task.label.clone();
            match unit.handle.jobs.try_send(pending.task) {
                Ok(()) => {
                    unit.state = UnitState::Busy(InFlight {
                        label,
                        reply: pending.reply,
                        started: Instant::now(),
                    });
                }
                Err(err) => {
                    // Unit thread is gone; requeue the task at the head and forget the unit.
                    warn!(unit = unit_id, "execution unit vanished, removing");
                    self.units.remove(&unit_id);
                    self.stats.faulted += 1;
                    self.queue.push_front(Pending { task: err.into_inner(), reply: pending.reply });
                }
            }

            let busy = self.busy_count();
            self.stats.peak_busy = self.stats.peak_busy.max(busy);
        }
    }

    fn idle_unit(&self) -> Option<UnitId> {
        self.units
            .iter()
            .find(|(_, unit)| matches!(unit.state, UnitState::Idle))
            .map(|(id, _)| *id)
    }

    fn spawn(&mut self) -> std::io::Result<UnitId> {
        let id = self.next_unit_id;
        let handle = spawn_unit(id, self.events_tx.clone(), self.executor)?;
        self.next_unit_id += 1;
        self.stats.spawned += 1;
        debug!(unit = handle.id, units = self.units.len() + 1, "execution unit spawned");
        self.units.insert(id, Unit { handle, state: UnitState::Idle });
        Ok(id)
    }

    fn busy_count(&self) -> usize {
        self.units
            .values()
            .filter(|unit| matches!(unit.state, UnitState::Busy(_)))
            .count()
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            units: self.units.len(),
            busy: self.busy_count(),
            queued: self.queue.len(),
            retired_running: self.retired.len(),
            ..self.stats.clone()
        }
    }
}
