//! Error types for truetrace

use crate::types::SubmissionStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while capturing, queuing, or submitting reports
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or malformed. Not retryable.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No network at attempt time
    #[error("offline: {0}")]
    Connectivity(String),

    /// The remote submission service rejected or errored
    #[error("submission service error: {0}")]
    RemoteService(String),

    /// The remote submission service did not answer in time
    #[error("submission service timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The durable queue could not be read or written
    #[error("queue persistence failed: {0}")]
    Persistence(String),

    /// A status change that the lifecycle does not allow
    #[error("cannot move submission from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: SubmissionStatus,
        /// Requested status
        to: SubmissionStatus,
    },

    /// Bad configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// The submission worker has shut down
    #[error("submission worker is not running")]
    WorkerStopped,

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this is a failure of the remote service (including timeouts).
    ///
    /// Remote failures are retryable and never discard a submission.
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteService(_) | Self::Timeout(_) | Self::Http(_))
    }
}

/// Result alias for truetrace operations
pub type Result<T> = std::result::Result<T, Error>;
