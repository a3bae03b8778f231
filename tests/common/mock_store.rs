//! In-memory queue store for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use truetrace::error::{Error, Result};
use truetrace::store::QueueStore;
use truetrace::types::Submission;

/// Queue store that keeps the persisted queue in memory
///
/// Counts writes and can be made to fail them.
#[derive(Default)]
pub struct MockQueueStore {
    persisted: Mutex<Vec<Submission>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MockQueueStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a queue persisted by an earlier session
    pub fn with_queue(queue: Vec<Submission>) -> Self {
        Self {
            persisted: Mutex::new(queue),
            ..Self::default()
        }
    }

    /// Make every later `save` fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Current persisted queue
    pub fn persisted(&self) -> Vec<Submission> {
        self.persisted.lock().unwrap().clone()
    }

    /// Number of successful writes
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueStore for MockQueueStore {
    async fn load(&self) -> Result<Vec<Submission>> {
        Ok(self.persisted())
    }

    async fn save(&self, queue: &[Submission]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Persistence("disk full".to_string()));
        }
        *self.persisted.lock().unwrap() = queue.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
