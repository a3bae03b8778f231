//! Submission lifecycle manager
//!
//! Owns the pending queue. Every queue mutation is written to the store
//! before the in-memory copy changes, so a failed write leaves both sides
//! as they were.

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::connectivity::ConnectivityObserver;
use crate::error::{Error, Result};
use crate::history::{Receipt, ReceiptLog};
use crate::remote::SubmissionService;
use crate::store::QueueStore;
use crate::submit::{NoopProgress, Phase, ProgressCallback};
use crate::types::{ConfirmationId, Draft, FinalizeOutcome, Submission, SubmissionStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Decides between immediate submission and local queuing, and drains the
/// queue when connectivity returns
///
/// All operations take `&mut self`, so at most one operation (and at most
/// one remote call) is in flight per manager.
pub struct SubmissionManager {
    pub(super) connectivity: Arc<dyn ConnectivityObserver>,
    pub(super) service: Arc<dyn SubmissionService>,
    pub(super) store: Arc<dyn QueueStore>,
    pub(super) progress: Arc<dyn ProgressCallback>,
    pub(super) receipts: Option<ReceiptLog>,
    pub(super) submit_timeout: Duration,
    pub(super) queue: Vec<Submission>,
}

impl SubmissionManager {
    /// Create a manager, recovering any queue persisted by a prior session
    pub async fn new(
        connectivity: Arc<dyn ConnectivityObserver>,
        service: Arc<dyn SubmissionService>,
        store: Arc<dyn QueueStore>,
    ) -> Result<Self> {
        let queue = store.load().await?;
        check_recovered(&queue)?;
        if !queue.is_empty() {
            info!(count = queue.len(), "recovered pending submissions");
        }

        Ok(Self {
            connectivity,
            service,
            store,
            progress: Arc::new(NoopProgress),
            receipts: None,
            submit_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            queue,
        })
    }

    /// Bound each remote attempt by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Record a receipt for every confirmed submission
    #[must_use]
    pub fn with_receipts(mut self, receipts: ReceiptLog) -> Self {
        self.receipts = Some(receipts);
        self
    }

    /// Submissions waiting for connectivity, in retry order
    pub fn pending(&self) -> &[Submission] {
        &self.queue
    }

    /// The connectivity observer this manager consults
    pub fn connectivity(&self) -> Arc<dyn ConnectivityObserver> {
        Arc::clone(&self.connectivity)
    }

    /// Finalize a captured report
    ///
    /// Offline: the submission is appended to the pending queue. Online: it
    /// is submitted immediately; a failed attempt is returned as
    /// [`FinalizeOutcome::SubmissionFailed`] rather than an error.
    pub async fn finalize(&mut self, draft: Draft) -> Result<FinalizeOutcome> {
        let submission = draft.into_submission()?;
        debug!(id = %submission.id(), engineer = %submission.engineer_id(), "finalizing");
        self.deliver(submission).await
    }

    /// Retry a submission whose previous attempt failed
    ///
    /// Queues it instead if the device is offline.
    pub async fn retry(&mut self, failed: Submission) -> Result<FinalizeOutcome> {
        expect_failed(&failed, SubmissionStatus::Submitting)?;
        self.deliver(failed).await
    }

    /// Park a failed submission at the tail of the pending queue
    pub async fn requeue(&mut self, failed: Submission) -> Result<Submission> {
        expect_failed(&failed, SubmissionStatus::QueuedOffline)?;
        self.enqueue(failed).await
    }

    async fn deliver(&mut self, submission: Submission) -> Result<FinalizeOutcome> {
        if !self.connectivity.is_online() {
            self.progress
                .on_message("Offline: report saved locally and will be sent when back online")
                .await;
            let queued = self.enqueue(submission).await?;
            return Ok(FinalizeOutcome::QueuedLocally(queued));
        }

        self.progress.on_phase(Phase::Submitting).await;
        let outcome = self.attempt(submission).await?;
        self.progress.on_phase(Phase::Complete).await;
        Ok(outcome)
    }

    async fn enqueue(&mut self, mut submission: Submission) -> Result<Submission> {
        if self.queue.iter().any(|s| s.id() == submission.id()) {
            return Err(Error::Validation(format!(
                "submission {} is already queued",
                submission.id()
            )));
        }
        submission.mark_queued()?;

        let mut next = self.queue.clone();
        next.push(submission.clone());
        self.store.save(&next).await?;
        self.queue = next;

        info!(id = %submission.id(), queue_len = self.queue.len(), "queued submission");
        self.progress.on_queued(&submission, self.queue.len()).await;
        Ok(submission)
    }

    async fn attempt(&mut self, mut submission: Submission) -> Result<FinalizeOutcome> {
        submission.mark_submitting()?;
        self.progress.on_submitting(&submission).await;

        match self.call_service(&submission).await {
            Ok(confirmation_id) => {
                submission.confirm(confirmation_id)?;
                self.after_confirmed(&submission).await;
                Ok(FinalizeOutcome::Confirmed(submission))
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(id = %submission.id(), "submission failed: {reason}");
                submission.fail(reason.clone())?;
                self.progress.on_failed(&submission, &e).await;
                Ok(FinalizeOutcome::SubmissionFailed { submission, reason })
            }
        }
    }

    /// One remote call bounded by the configured timeout
    pub(super) async fn call_service(&self, submission: &Submission) -> Result<ConfirmationId> {
        tokio::time::timeout(self.submit_timeout, self.service.submit(submission))
            .await
            .unwrap_or(Err(Error::Timeout(self.submit_timeout)))
    }

    pub(super) async fn after_confirmed(&self, submission: &Submission) {
        if let Some(id) = submission.confirmation_id() {
            info!(id = %submission.id(), confirmation = %id, "submission confirmed");
        }
        self.progress.on_confirmed(submission).await;

        let (Some(log), Some(receipt)) = (&self.receipts, Receipt::from_confirmed(submission))
        else {
            return;
        };
        if let Err(e) = log.append(&receipt).await {
            warn!(id = %submission.id(), "failed to record receipt: {e}");
        }
    }
}

fn expect_failed(submission: &Submission, to: SubmissionStatus) -> Result<()> {
    if submission.status() == SubmissionStatus::Failed {
        Ok(())
    } else {
        Err(Error::InvalidTransition {
            from: submission.status(),
            to,
        })
    }
}

fn check_recovered(queue: &[Submission]) -> Result<()> {
    let mut seen = HashSet::new();
    for submission in queue {
        if submission.status() != SubmissionStatus::QueuedOffline {
            return Err(Error::Persistence(format!(
                "persisted queue holds submission {} in status {}",
                submission.id(),
                submission.status()
            )));
        }
        if !seen.insert(submission.id()) {
            return Err(Error::Persistence(format!(
                "persisted queue holds submission {} twice",
                submission.id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImagePayload;

    fn draft_submission() -> Submission {
        let image = ImagePayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0x01]).unwrap();
        Draft::new("ENG-1", Some(image)).into_submission().unwrap()
    }

    #[test]
    fn test_check_recovered_rejects_non_queued() {
        let err = check_recovered(&[draft_submission()]).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_check_recovered_rejects_duplicates() {
        let mut sub = draft_submission();
        sub.mark_queued().unwrap();
        let err = check_recovered(&[sub.clone(), sub]).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn test_expect_failed() {
        let mut sub = draft_submission();
        assert!(expect_failed(&sub, SubmissionStatus::Submitting).is_err());
        sub.mark_submitting().unwrap();
        sub.fail("boom").unwrap();
        assert!(expect_failed(&sub, SubmissionStatus::Submitting).is_ok());
    }
}
