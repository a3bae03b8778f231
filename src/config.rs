//! Runtime configuration
//!
//! Values come from `TRUETRACE_*` environment variables over built-in
//! defaults. Command-line flags are applied on top by the binary.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default bound on one remote submission attempt
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default connectivity probe period
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 10;

const QUEUE_FILE: &str = "pending-queue.json";
const RECEIPTS_FILE: &str = "receipts.jsonl";

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the pending queue and receipt log
    pub data_dir: PathBuf,
    /// Base URL of the submission service
    pub endpoint: Option<Url>,
    /// Bearer token for the submission service
    pub token: Option<String>,
    /// URL polled to decide whether the device is online; defaults to the endpoint
    pub probe_url: Option<Url>,
    /// Connectivity probe period
    pub probe_interval: Duration,
    /// Bound on one remote submission attempt
    pub submit_timeout: Duration,
    /// Prefix for links to confirmed submissions (e.g. a block explorer)
    pub explorer_url: Option<Url>,
}

impl Config {
    /// Resolve from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| normalize(lookup(key));

        let data_dir = match var("TRUETRACE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Self {
            data_dir,
            endpoint: var("TRUETRACE_ENDPOINT")
                .map(|v| parse_url("TRUETRACE_ENDPOINT", &v))
                .transpose()?,
            token: var("TRUETRACE_TOKEN"),
            probe_url: var("TRUETRACE_PROBE_URL")
                .map(|v| parse_url("TRUETRACE_PROBE_URL", &v))
                .transpose()?,
            probe_interval: var("TRUETRACE_PROBE_INTERVAL_SECS")
                .map(|v| parse_secs("TRUETRACE_PROBE_INTERVAL_SECS", &v))
                .transpose()?
                .unwrap_or(Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS)),
            submit_timeout: var("TRUETRACE_TIMEOUT_SECS")
                .map(|v| parse_secs("TRUETRACE_TIMEOUT_SECS", &v))
                .transpose()?
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            explorer_url: var("TRUETRACE_EXPLORER_URL")
                .map(|v| parse_url("TRUETRACE_EXPLORER_URL", &v))
                .transpose()?,
        })
    }

    /// Path of the pending queue file
    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join(QUEUE_FILE)
    }

    /// Path of the receipt log
    pub fn receipts_path(&self) -> PathBuf {
        self.data_dir.join(RECEIPTS_FILE)
    }

    /// URL used for connectivity probing
    pub fn effective_probe_url(&self) -> Option<&Url> {
        self.probe_url.as_ref().or(self.endpoint.as_ref())
    }

    /// Link to a confirmation in the explorer, if one is configured
    pub fn explorer_link(&self, confirmation_id: &str) -> Option<String> {
        self.explorer_url.as_ref().map(|base| {
            format!("{}/{confirmation_id}", base.as_str().trim_end_matches('/'))
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("truetrace"))
        .ok_or_else(|| {
            Error::Config("no data directory found; set TRUETRACE_DATA_DIR".to_string())
        })
}

/// Parse an http(s) URL
pub fn parse_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("{key}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Config(format!(
            "{key}: unsupported scheme '{other}', expected http or https"
        ))),
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .map_err(|_| Error::Config(format!("{key}: expected whole seconds, got '{raw}'")))?;
    if secs == 0 {
        return Err(Error::Config(format!("{key}: must be at least 1 second")));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("TRUETRACE_DATA_DIR", "/tmp/tt")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tt"));
        assert_eq!(config.queue_path(), PathBuf::from("/tmp/tt/pending-queue.json"));
        assert_eq!(config.submit_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.endpoint.is_none());
        assert!(config.effective_probe_url().is_none());
    }

    #[test]
    fn test_probe_url_falls_back_to_endpoint() {
        let config = Config::from_lookup(lookup(&[
            ("TRUETRACE_DATA_DIR", "/tmp/tt"),
            ("TRUETRACE_ENDPOINT", "https://ledger.example.com/api"),
        ]))
        .unwrap();
        assert_eq!(
            config.effective_probe_url().unwrap().as_str(),
            "https://ledger.example.com/api"
        );
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("TRUETRACE_DATA_DIR", "/tmp/tt"),
            ("TRUETRACE_TOKEN", "   "),
        ]))
        .unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_url = Config::from_lookup(lookup(&[
            ("TRUETRACE_DATA_DIR", "/tmp/tt"),
            ("TRUETRACE_ENDPOINT", "ftp://ledger"),
        ]));
        assert!(matches!(bad_url, Err(Error::Config(_))));

        let bad_timeout = Config::from_lookup(lookup(&[
            ("TRUETRACE_DATA_DIR", "/tmp/tt"),
            ("TRUETRACE_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(bad_timeout, Err(Error::Config(_))));
    }

    #[test]
    fn test_explorer_link() {
        let config = Config::from_lookup(lookup(&[
            ("TRUETRACE_DATA_DIR", "/tmp/tt"),
            ("TRUETRACE_EXPLORER_URL", "https://explorer.example.com/tx/"),
        ]))
        .unwrap();
        assert_eq!(
            config.explorer_link("0xabc").as_deref(),
            Some("https://explorer.example.com/tx/0xabc")
        );
    }
}
