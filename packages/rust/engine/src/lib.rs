//! Concurrent harvest engine: partitioning, retry, extraction, and the
//! orchestrated worker pool.
//!
//! This crate provides:
//! - [`partition`] — splits the page interval across the worker pool
//! - [`retry`] — bounded retry with a fixed inter-attempt delay
//! - [`extract`] — pure listing/detail extraction over DOM snapshots
//! - [`worker`] — one session, one range, failure isolation
//! - [`orchestrator`] — spawn all workers, join, drain batches to the sink

pub mod extract;
pub mod orchestrator;
pub mod partition;
pub mod retry;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{ProgressReporter, RunSummary, SilentProgress, run};
pub use partition::partition;
pub use worker::{BatchWorker, OverlayOutcome};
