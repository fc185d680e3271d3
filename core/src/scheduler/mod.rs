//! scheduler/mod.rs
//! Bounded parallel execution of independent cipher tasks.
//!
//! - `WorkerPool` runs tasks on at most `max_units` OS threads with a per-task timeout.
//! - `run_batch` is the entry point the codec uses: pool first, caller thread on failure.
//! - Results always come back in submission order.

pub mod types;
pub mod policy;
pub(crate) mod unit;
pub mod pool;
pub mod sequential;

pub use types::*;
pub use policy::{max_units_for, ParallelismProfile, PoolMode};
pub use pool::WorkerPool;
pub use sequential::{execute_task, run_batch, run_sequential, BatchOutcome};
