//! Remote submission service
//!
//! The ledger that accepts finalized reports and returns a confirmation id.
//! Idempotency is not guaranteed by the service, so callers must never
//! issue concurrent calls for the same submission.

mod http;

pub use http::HttpSubmissionService;

use crate::error::Result;
use crate::types::{ConfirmationId, Submission};
use async_trait::async_trait;

/// Accepts a submission and returns its confirmation id
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Submit one report
    async fn submit(&self, submission: &Submission) -> Result<ConfirmationId>;
}
