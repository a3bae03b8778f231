//! Receipt log of confirmed submissions

use crate::error::{Error, Result};
use crate::types::{ConfirmationId, Location, Submission};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

/// Record of one confirmed submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Submission id
    pub submission_id: Uuid,
    /// Engineer who captured the report
    pub engineer_id: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// GPS fix at capture, if any
    pub location: Option<Location>,
    /// Id returned by the remote service
    pub confirmation_id: ConfirmationId,
    /// When the confirmation was recorded locally
    pub confirmed_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt from a confirmed submission
    pub fn from_confirmed(submission: &Submission) -> Option<Self> {
        let confirmation_id = submission.confirmation_id()?.clone();
        Some(Self {
            submission_id: submission.id(),
            engineer_id: submission.engineer_id().to_string(),
            captured_at: submission.captured_at(),
            location: submission.location(),
            confirmation_id,
            confirmed_at: Utc::now(),
        })
    }

    fn matches(&self, needle: &str) -> bool {
        self.engineer_id.to_lowercase().contains(needle)
            || self
                .confirmation_id
                .as_str()
                .to_lowercase()
                .contains(needle)
    }
}

/// Append-only JSON-lines log of receipts
#[derive(Debug, Clone)]
pub struct ReceiptLog {
    path: PathBuf,
}

impl ReceiptLog {
    /// Create a log backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one receipt
    pub async fn append(&self, receipt: &Receipt) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_vec(receipt)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.sync_data().await?;
        Ok(())
    }

    /// All receipts, newest first
    ///
    /// Unparseable lines (e.g. a torn final write) are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Receipt>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut receipts: Vec<Receipt> = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!("skipping unreadable receipt: {e}");
                    None
                }
            })
            .collect();
        receipts.reverse();
        Ok(receipts)
    }

    /// Receipts whose engineer id or confirmation id contains `term`
    /// (case-insensitive); a blank term matches everything
    pub async fn search(&self, term: &str) -> Result<Vec<Receipt>> {
        let needle = term.trim().to_lowercase();
        let receipts = self.list().await?;
        if needle.is_empty() {
            return Ok(receipts);
        }
        Ok(receipts.into_iter().filter(|r| r.matches(&needle)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn receipt(engineer: &str, confirmation: &str) -> Receipt {
        Receipt {
            submission_id: Uuid::new_v4(),
            engineer_id: engineer.to_string(),
            captured_at: Utc::now(),
            location: Some(Location {
                lat: 37.7749,
                lon: -122.4194,
            }),
            confirmation_id: ConfirmationId::new(confirmation).unwrap(),
            confirmed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let log = ReceiptLog::new(dir.path().join("receipts.jsonl"));

        log.append(&receipt("ENG-1", "0xaaa")).await.unwrap();
        log.append(&receipt("ENG-2", "0xbbb")).await.unwrap();

        let all = log.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].engineer_id, "ENG-2");
        assert_eq!(all[1].engineer_id, "ENG-1");
    }

    #[tokio::test]
    async fn test_search_matches_engineer_or_confirmation() {
        let dir = TempDir::new().unwrap();
        let log = ReceiptLog::new(dir.path().join("receipts.jsonl"));
        log.append(&receipt("ENG-1234", "0x7FC5c43d")).await.unwrap();
        log.append(&receipt("ENG-9999", "0x5ba91d8e")).await.unwrap();

        let by_engineer = log.search("eng-12").await.unwrap();
        assert_eq!(by_engineer.len(), 1);
        assert_eq!(by_engineer[0].engineer_id, "ENG-1234");

        let by_hash = log.search("7fc5").await.unwrap();
        assert_eq!(by_hash.len(), 1);

        assert_eq!(log.search("  ").await.unwrap().len(), 2);
        assert!(log.search("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_torn_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receipts.jsonl");
        let log = ReceiptLog::new(&path);
        log.append(&receipt("ENG-1", "0x1")).await.unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        contents.push_str("{\"submission_id\":");
        std::fs::write(&path, contents).unwrap();

        assert_eq!(log.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_log_is_empty() {
        let dir = TempDir::new().unwrap();
        let log = ReceiptLog::new(dir.path().join("none.jsonl"));
        assert!(log.list().await.unwrap().is_empty());
    }
}
