//! Mock submission service for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use truetrace::error::{Error, Result};
use truetrace::remote::SubmissionService;
use truetrace::types::{ConfirmationId, Submission};

/// Simple mock submission service
///
/// Features:
/// - Auto-incrementing confirmation ids (`0x1`, `0x2`, ...)
/// - Call tracking by engineer id
/// - Per-engineer rejection and hanging for failure path testing
pub struct MockSubmissionService {
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
    reject: Mutex<HashSet<String>>,
    hang: Mutex<HashSet<String>>,
    started: Notify,
}

impl Default for MockSubmissionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSubmissionService {
    /// Create a mock that accepts everything
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            reject: Mutex::new(HashSet::new()),
            hang: Mutex::new(HashSet::new()),
            started: Notify::new(),
        }
    }

    // === Error injection methods ===

    /// Reject submissions from `engineer`
    pub fn reject(&self, engineer: &str) {
        self.reject.lock().unwrap().insert(engineer.to_string());
    }

    /// Accept submissions from `engineer` again
    pub fn accept(&self, engineer: &str) {
        self.reject.lock().unwrap().remove(engineer);
    }

    /// Never answer submissions from `engineer`
    pub fn hang(&self, engineer: &str) {
        self.hang.lock().unwrap().insert(engineer.to_string());
    }

    /// Answer submissions from `engineer` normally from now on
    pub fn release(&self, engineer: &str) {
        self.hang.lock().unwrap().remove(engineer);
    }

    // === Call verification methods ===

    /// Engineer ids of every call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Wait until a call has started
    pub async fn wait_for_call(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl SubmissionService for MockSubmissionService {
    async fn submit(&self, submission: &Submission) -> Result<ConfirmationId> {
        let engineer = submission.engineer_id().to_string();
        self.calls.lock().unwrap().push(engineer.clone());
        self.started.notify_one();

        let hangs = self.hang.lock().unwrap().contains(&engineer);
        if hangs {
            std::future::pending::<()>().await;
        }

        if self.reject.lock().unwrap().contains(&engineer) {
            return Err(Error::RemoteService(format!(
                "rejected report from {engineer}"
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        ConfirmationId::new(format!("0x{id:x}"))
    }
}
