//! Reconnect drain of the pending queue
//!
//! Entries are submitted strictly one at a time in insertion order. An
//! entry only leaves the queue once the service has confirmed it, so an
//! interrupted or failed attempt leaves it where it was.

use crate::error::{Error, Result};
use crate::submit::{Phase, SubmissionManager};
use crate::types::{ConfirmationId, Submission};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A queued submission whose drain attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainFailure {
    /// Id of the submission that stays queued
    pub submission_id: Uuid,
    /// Why the attempt failed
    pub reason: String,
}

/// Outcome of one drain pass
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    /// Submissions confirmed in this pass, in submission order
    pub confirmed: Vec<Submission>,
    /// Attempts that failed; those entries stay queued for the next pass
    pub failed: Vec<DrainFailure>,
    /// Whether connectivity dropped and the pass stopped early
    pub interrupted: bool,
    /// Queue length after the pass
    pub remaining: usize,
}

impl DrainReport {
    /// Whether the pass made no remote calls
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.failed.is_empty()
    }
}

enum Attempt {
    Finished(Result<ConfirmationId>),
    WentOffline,
}

impl SubmissionManager {
    /// Drain the pending queue after connectivity is restored
    ///
    /// Each entry gets at most one attempt per pass. A pass over an empty
    /// queue does nothing: no store write and no remote call. If
    /// connectivity drops mid-pass the in-flight attempt is abandoned, the
    /// entry stays queued, and the pass stops.
    pub async fn on_connectivity_restored(&mut self) -> Result<DrainReport> {
        if self.queue.is_empty() {
            debug!("pending queue empty, nothing to drain");
            return Ok(DrainReport::default());
        }

        let connectivity = self.connectivity.subscribe();
        let mut report = DrainReport::default();

        if !connectivity.is_online() {
            report.interrupted = true;
            report.remaining = self.queue.len();
            return Ok(report);
        }

        info!(count = self.queue.len(), "draining pending queue");
        self.progress.on_phase(Phase::Draining).await;

        let order: Vec<Uuid> = self.queue.iter().map(|s| s.id()).collect();
        for id in order {
            if !connectivity.is_online() {
                report.interrupted = true;
                break;
            }
            let Some(position) = self.queue.iter().position(|s| s.id() == id) else {
                continue;
            };

            let mut attempt = self.queue[position].clone();
            attempt.mark_submitting()?;
            self.progress.on_submitting(&attempt).await;

            let result = tokio::select! {
                biased;
                () = connectivity.offline() => Attempt::WentOffline,
                result = self.call_service(&attempt) => Attempt::Finished(result),
            };

            match result {
                Attempt::WentOffline => {
                    warn!(id = %id, "connectivity lost mid-drain, keeping submission queued");
                    self.progress
                        .on_message("Connection lost: remaining reports stay queued")
                        .await;
                    report.interrupted = true;
                    break;
                }
                Attempt::Finished(Ok(confirmation_id)) => {
                    attempt.confirm(confirmation_id)?;
                    self.remove_confirmed(position, &attempt).await?;
                    self.after_confirmed(&attempt).await;
                    report.confirmed.push(attempt);
                }
                Attempt::Finished(Err(e)) => {
                    let reason = e.to_string();
                    warn!(id = %id, "queued submission failed: {reason}");
                    attempt.fail(reason.clone())?;
                    self.progress.on_failed(&attempt, &e).await;
                    attempt.mark_queued()?;
                    self.replace_queued(position, attempt).await?;
                    report.failed.push(DrainFailure {
                        submission_id: id,
                        reason,
                    });
                }
            }
        }

        report.remaining = self.queue.len();
        info!(
            confirmed = report.confirmed.len(),
            failed = report.failed.len(),
            remaining = report.remaining,
            interrupted = report.interrupted,
            "drain pass finished"
        );
        self.progress.on_phase(Phase::Complete).await;
        Ok(report)
    }

    async fn remove_confirmed(&mut self, position: usize, confirmed: &Submission) -> Result<()> {
        let mut next = self.queue.clone();
        next.remove(position);
        self.store.save(&next).await.map_err(|e| {
            let confirmation = confirmed
                .confirmation_id()
                .map(ToString::to_string)
                .unwrap_or_default();
            Error::Persistence(format!(
                "submission {} was confirmed as {confirmation} but the queue could not be updated: {e}",
                confirmed.id()
            ))
        })?;
        self.queue = next;
        Ok(())
    }

    async fn replace_queued(&mut self, position: usize, queued: Submission) -> Result<()> {
        let mut next = self.queue.clone();
        next[position] = queued;
        self.store.save(&next).await?;
        self.queue = next;
        Ok(())
    }
}
