//! Event loop serializing user commands and connectivity changes
//!
//! A single task owns the [`SubmissionManager`]. Commands from any number of
//! [`WorkerHandle`]s and connectivity transitions are handled one at a time,
//! so a drain pass never overlaps another pass or a `finalize`.

use crate::connectivity::{ConnectivityEvent, ConnectivitySubscription};
use crate::error::{Error, Result};
use crate::submit::{DrainReport, SubmissionManager};
use crate::types::{Draft, FinalizeOutcome, Submission};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;

enum Command {
    Finalize(Draft, oneshot::Sender<Result<FinalizeOutcome>>),
    Retry(Submission, oneshot::Sender<Result<FinalizeOutcome>>),
    Requeue(Submission, oneshot::Sender<Result<Submission>>),
    Pending(oneshot::Sender<Vec<Submission>>),
    Drain(oneshot::Sender<Result<DrainReport>>),
    Shutdown,
}

/// Cloneable handle for sending commands to a running worker
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Command>,
}

impl WorkerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| Error::WorkerStopped)?;
        rx.await.map_err(|_| Error::WorkerStopped)
    }

    /// Finalize a draft (see [`SubmissionManager::finalize`])
    pub async fn finalize(&self, draft: Draft) -> Result<FinalizeOutcome> {
        self.request(|reply| Command::Finalize(draft, reply)).await?
    }

    /// Retry a failed submission (see [`SubmissionManager::retry`])
    pub async fn retry(&self, failed: Submission) -> Result<FinalizeOutcome> {
        self.request(|reply| Command::Retry(failed, reply)).await?
    }

    /// Queue a failed submission (see [`SubmissionManager::requeue`])
    pub async fn requeue(&self, failed: Submission) -> Result<Submission> {
        self.request(|reply| Command::Requeue(failed, reply)).await?
    }

    /// Snapshot of the pending queue
    pub async fn pending(&self) -> Result<Vec<Submission>> {
        self.request(Command::Pending).await
    }

    /// Run a drain pass now, regardless of connectivity transitions
    pub async fn drain(&self) -> Result<DrainReport> {
        self.request(Command::Drain).await?
    }

    /// Ask the worker to stop after the current command
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

/// Owns a manager and runs its event loop
pub struct SubmissionWorker {
    manager: SubmissionManager,
    commands: mpsc::Receiver<Command>,
}

impl SubmissionWorker {
    /// Wrap a manager; commands sent before [`run`](Self::run) are buffered
    pub fn new(manager: SubmissionManager) -> (Self, WorkerHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        (Self { manager, commands }, WorkerHandle { tx })
    }

    /// Spawn the event loop on the current runtime
    pub fn spawn(manager: SubmissionManager) -> (WorkerHandle, JoinHandle<SubmissionManager>) {
        let (worker, handle) = Self::new(manager);
        (handle, tokio::spawn(worker.run()))
    }

    /// Run until shut down or every handle is dropped
    ///
    /// Subscribes to connectivity on entry and unsubscribes on exit. Returns
    /// the manager so callers can inspect the final queue.
    pub async fn run(mut self) -> SubmissionManager {
        let mut connectivity = self.manager.connectivity().subscribe();
        let mut observer_alive = true;

        if connectivity.is_online() && !self.manager.pending().is_empty() {
            self.drain_pass(&mut connectivity).await;
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command, &mut connectivity).await,
                },
                event = connectivity.next_event(), if observer_alive => match event {
                    Some(ConnectivityEvent::WentOnline) => {
                        info!("back online");
                        self.drain_pass(&mut connectivity).await;
                    }
                    Some(ConnectivityEvent::WentOffline) => {
                        info!("offline, new reports will be queued locally");
                    }
                    None => {
                        debug!("connectivity observer closed");
                        observer_alive = false;
                    }
                },
            }
        }

        drop(connectivity);
        debug!("submission worker stopped");
        self.manager
    }

    async fn handle(&mut self, command: Command, connectivity: &mut ConnectivitySubscription) {
        match command {
            Command::Finalize(draft, reply) => {
                let _ = reply.send(self.manager.finalize(draft).await);
            }
            Command::Retry(failed, reply) => {
                let _ = reply.send(self.manager.retry(failed).await);
            }
            Command::Requeue(failed, reply) => {
                let _ = reply.send(self.manager.requeue(failed).await);
            }
            Command::Pending(reply) => {
                let _ = reply.send(self.manager.pending().to_vec());
            }
            Command::Drain(reply) => {
                let result = self.manager.on_connectivity_restored().await;
                settle(connectivity, result.as_ref().ok());
                let _ = reply.send(result);
            }
            Command::Shutdown => {}
        }
    }

    async fn drain_pass(&mut self, connectivity: &mut ConnectivitySubscription) {
        match self.manager.on_connectivity_restored().await {
            Ok(report) => settle(connectivity, Some(&report)),
            Err(e) => {
                warn!("drain pass failed: {e}");
                settle(connectivity, None);
            }
        }
    }
}

/// Decide which state the loop has "seen" after a drain pass
///
/// Online edges that arrived while the pass ran are absorbed: the pass
/// already covered them. If the pass was cut short by going offline, the
/// offline state counts as seen, so a later return to online starts a
/// fresh pass.
fn settle(connectivity: &mut ConnectivitySubscription, report: Option<&DrainReport>) {
    connectivity.mark_seen();
    if report.is_some_and(|r| r.interrupted) {
        connectivity.record_seen(false);
    }
}
