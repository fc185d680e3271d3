//! scheduler/sequential.rs
//! Task execution on the caller thread, and the pool-or-fallback batch driver.

use bytes::Bytes;
use tracing::{debug, warn};

use crate::crypto::{decrypt, encrypt};
use crate::scheduler::pool::WorkerPool;
use crate::scheduler::types::{SchedulerError, Task, TaskError, TaskOp};

/// Run one task to completion. Also the executor every pool unit applies.
pub fn execute_task(task: &Task) -> Result<Bytes, TaskError> {
    let out = match task.op {
        TaskOp::Encrypt => encrypt(&task.payload, &task.key)?,
        TaskOp::Decrypt => decrypt(&task.payload, &task.key)?,
    };
    Ok(Bytes::from(out))
}

/// Run `tasks` in order on the caller thread; stops at the first failure.
pub fn run_sequential(tasks: &[Task]) -> Result<Vec<Bytes>, SchedulerError> {
    tasks
        .iter()
        .map(|task| {
            execute_task(task).map_err(|source| SchedulerError::Rejected {
                label: task.label.clone(),
                source,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One payload per task, in submission order.
    pub payloads: Vec<Bytes>,
    /// `true` if the batch ran (or re-ran) on the caller thread.
    pub sequential: bool,
}

/// Run a batch on `pool` when there is one, re-running it sequentially if the pool
/// is unusable or a unit timed out or faulted. Cipher errors are returned as-is.
pub fn run_batch(pool: Option<&WorkerPool>, tasks: Vec<Task>) -> Result<BatchOutcome, SchedulerError> {
    if tasks.is_empty() {
        return Ok(BatchOutcome { payloads: Vec::new(), sequential: false });
    }

    let Some(pool) = pool else {
        debug!(tasks = tasks.len(), "no worker pool, running batch sequentially");
        let payloads = run_sequential(&tasks)?;
        return Ok(BatchOutcome { payloads, sequential: true });
    };

    // Payloads are refcounted, so keeping a copy for the fallback path is cheap.
    match pool.submit_batch(tasks.clone()) {
        Ok(results) => {
            let payloads = results
                .into_iter()
                .map(|r| {
                    let label = r.label;
                    r.outcome.map_err(|source| SchedulerError::Rejected { label, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BatchOutcome { payloads, sequential: false })
        }
        Err(e) if e.allows_fallback() => {
            warn!(error = %e, tasks = tasks.len(), "worker pool failed, falling back to sequential execution");
            let payloads = run_sequential(&tasks)?;
            Ok(BatchOutcome { payloads, sequential: true })
        }
        Err(e) => Err(e),
    }
}
