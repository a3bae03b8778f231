//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different interfaces (CLI, background service, etc.)
//! to receive progress updates while submissions move through the lifecycle.

use crate::error::Error;
use crate::types::Submission;
use async_trait::async_trait;
use std::fmt;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Submitting a freshly finalized report
    Submitting,
    /// Draining the pending queue after reconnect
    Draining,
    /// Work finished
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitting => write!(f, "Submitting report"),
            Self::Draining => write!(f, "Submitting queued reports"),
            Self::Complete => write!(f, "Done"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates.
/// - CLI implementations can print to terminal
/// - Long-running services can forward to a UI or notification channel
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when a submission is parked in the pending queue
    async fn on_queued(&self, submission: &Submission, queue_len: usize);

    /// Called before a remote attempt starts
    async fn on_submitting(&self, submission: &Submission);

    /// Called when the remote service confirms a submission
    async fn on_confirmed(&self, submission: &Submission);

    /// Called when a remote attempt fails (non-fatal)
    async fn on_failed(&self, submission: &Submission, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_queued(&self, _submission: &Submission, _queue_len: usize) {}
    async fn on_submitting(&self, _submission: &Submission) {}
    async fn on_confirmed(&self, _submission: &Submission) {}
    async fn on_failed(&self, _submission: &Submission, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
