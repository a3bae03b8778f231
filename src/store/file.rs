//! JSON file queue store

use crate::error::{Error, Result};
use crate::store::QueueStore;
use crate::types::Submission;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const QUEUE_FORMAT_VERSION: u8 = 1;

#[derive(Serialize)]
struct QueueFileRef<'a> {
    version: u8,
    submissions: &'a [Submission],
}

#[derive(Deserialize)]
struct QueueFile {
    version: u8,
    submissions: Vec<Submission>,
}

/// Stores the queue as one JSON document
///
/// Writes go to a temporary file in the same directory which is synced and
/// then renamed over the old file, so readers see either the old or the new
/// queue in full.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    /// Create a store backed by `path`; the file is created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the queue file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QueueStore for FileQueueStore {
    async fn load(&self) -> Result<Vec<Submission>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no queue file yet");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::Persistence(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let file: QueueFile = serde_json::from_slice(&bytes).map_err(|e| {
            Error::Persistence(format!("corrupt queue file {}: {e}", self.path.display()))
        })?;

        if file.version != QUEUE_FORMAT_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported queue file version {} in {}",
                file.version,
                self.path.display()
            )));
        }

        debug!(count = file.submissions.len(), "loaded pending queue");
        Ok(file.submissions)
    }

    async fn save(&self, queue: &[Submission]) -> Result<()> {
        let json = serde_json::to_vec_pretty(&QueueFileRef {
            version: QUEUE_FORMAT_VERSION,
            submissions: queue,
        })
        .map_err(|e| Error::Persistence(format!("failed to encode queue: {e}")))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| Error::Persistence(format!("queue writer task failed: {e}")))?
            .map_err(|e| {
                Error::Persistence(format!("failed to write {}: {e}", self.path.display()))
            })?;

        debug!(count = queue.len(), "persisted pending queue");
        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
