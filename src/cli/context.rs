//! Wiring shared by all commands: configuration, connectivity, and the manager

use crate::cli::progress::CliProgress;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use truetrace::config::{Config, parse_url};
use truetrace::connectivity::{ConnectivityMonitor, ConnectivityObserver, HttpProbe};
use truetrace::error::{Error, Result};
use truetrace::history::ReceiptLog;
use truetrace::remote::{HttpSubmissionService, SubmissionService};
use truetrace::store::FileQueueStore;
use truetrace::submit::SubmissionManager;
use truetrace::types::{ConfirmationId, Submission};

/// Flags accepted by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Overrides `TRUETRACE_DATA_DIR`
    pub data_dir: Option<PathBuf>,
    /// Overrides `TRUETRACE_ENDPOINT`
    pub endpoint: Option<String>,
    /// Treat the device as offline without probing
    pub offline: bool,
}

/// Resolved configuration plus the command-line overrides
pub struct Context {
    /// Effective configuration
    pub config: Config,
    offline: bool,
}

impl Context {
    /// Resolve configuration from the environment and apply `options`
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let mut config = Config::from_env()?;
        if let Some(dir) = &options.data_dir {
            config.data_dir.clone_from(dir);
        }
        if let Some(endpoint) = &options.endpoint {
            config.endpoint = Some(parse_url("--endpoint", endpoint)?);
        }
        debug!(data_dir = %config.data_dir.display(), "configuration resolved");
        Ok(Self {
            config,
            offline: options.offline,
        })
    }

    /// Whether a submission endpoint is configured
    pub const fn has_endpoint(&self) -> bool {
        self.config.endpoint.is_some()
    }

    /// Receipt log under the data directory
    pub fn receipts(&self) -> ReceiptLog {
        ReceiptLog::new(self.config.receipts_path())
    }

    /// Connectivity source for this run
    ///
    /// Forced offline, or offline when there is nothing to probe. Otherwise
    /// the probe URL (or the endpoint) is polled in the background.
    pub async fn connectivity(&self) -> Result<Arc<dyn ConnectivityObserver>> {
        if self.offline {
            return Ok(Arc::new(ConnectivityMonitor::new(false)));
        }
        match self.config.effective_probe_url() {
            Some(url) => {
                let probe = HttpProbe::start(url.to_string(), self.config.probe_interval).await?;
                Ok(Arc::new(probe))
            }
            None => Ok(Arc::new(ConnectivityMonitor::new(false))),
        }
    }

    fn service(&self) -> Result<Arc<dyn SubmissionService>> {
        match &self.config.endpoint {
            Some(endpoint) => Ok(Arc::new(HttpSubmissionService::new(
                endpoint.clone(),
                self.config.token.clone(),
                self.config.submit_timeout,
            )?)),
            None => Ok(Arc::new(NoEndpoint)),
        }
    }

    /// Build a manager over the on-disk queue, reporting to `progress`
    pub async fn manager(&self, progress: CliProgress) -> Result<SubmissionManager> {
        let store = Arc::new(FileQueueStore::new(self.config.queue_path()));
        let manager = SubmissionManager::new(self.connectivity().await?, self.service()?, store)
            .await?
            .with_timeout(self.config.submit_timeout)
            .with_progress(Arc::new(progress))
            .with_receipts(self.receipts());
        Ok(manager)
    }
}

/// Service used when no endpoint is configured; every attempt fails
struct NoEndpoint;

#[async_trait]
impl SubmissionService for NoEndpoint {
    async fn submit(&self, _submission: &Submission) -> Result<ConfirmationId> {
        Err(Error::Config(
            "no submission endpoint configured; set TRUETRACE_ENDPOINT".to_string(),
        ))
    }
}
