//! HTTP reachability probe

use crate::connectivity::{ConnectivityMonitor, ConnectivityObserver, ConnectivitySubscription};
use crate::error::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Per-probe request timeout
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Polls a URL and treats any HTTP response as "online"
///
/// The background task is aborted when the probe is dropped.
pub struct HttpProbe {
    monitor: Arc<ConnectivityMonitor>,
    task: JoinHandle<()>,
}

impl HttpProbe {
    /// Probe once, then start polling every `interval`
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(url: String, interval: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()?;

        let initial = probe_once(&client, &url).await;
        let monitor = Arc::new(ConnectivityMonitor::new(initial));
        debug!(%url, online = initial, "connectivity probe started");

        let task = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let online = probe_once(&client, &url).await;
                    trace!(online, "probe tick");
                    monitor.set_online(online);
                }
            }
        });

        Ok(Self { monitor, task })
    }
}

impl Drop for HttpProbe {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ConnectivityObserver for HttpProbe {
    fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    fn subscribe(&self) -> ConnectivitySubscription {
        self.monitor.subscribe()
    }
}

async fn probe_once(client: &Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(_) => true,
        Err(e) => {
            trace!("probe failed: {e}");
            false
        }
    }
}
