//! Submission lifecycle
//!
//! Handles the workflow of delivering finalized reports:
//! 1. Finalize - validate, then submit now (online) or queue (offline)
//! 2. Drain - on reconnect, submit queued reports one at a time, in order
//! 3. Worker - serialize user commands and connectivity events on one task

mod drain;
mod manager;
mod progress;
mod worker;

pub use drain::{DrainFailure, DrainReport};
pub use manager::SubmissionManager;
pub use progress::{NoopProgress, Phase, ProgressCallback};
pub use worker::{SubmissionWorker, WorkerHandle};
