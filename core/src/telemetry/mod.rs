//! telemetry/mod.rs
//! Counters, stage timers and progress reporting for codec runs.

pub mod counters;
pub mod timers;
pub mod progress;

pub use counters::*;
pub use timers::*;
pub use progress::*;
