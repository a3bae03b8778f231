//! Durable pending-queue storage
//!
//! The queue must survive a restart, and a partial write must never corrupt
//! the persisted copy.

mod file;

pub use file::FileQueueStore;

use crate::error::Result;
use crate::types::Submission;
use async_trait::async_trait;

/// Persists the pending queue as a whole
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load the queue in insertion order; an absent queue loads as empty
    async fn load(&self) -> Result<Vec<Submission>>;

    /// Atomically replace the persisted queue
    async fn save(&self, queue: &[Submission]) -> Result<()>;
}
