//! Shared CLI progress callback with styled output and spinners

use crate::cli::style::{Stream, Stylize, check, cross, hyperlink, spinner_style};
use anstream::{eprintln, println};
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;
use truetrace::config::Config;
use truetrace::error::Error;
use truetrace::submit::{Phase, ProgressCallback};
use truetrace::types::Submission;

/// CLI progress callback that prints to stdout with styled output
///
/// Two modes:
/// - verbose (submit, sync): shows phases and a spinner per remote call
/// - compact (watch): one line per event, no spinner
pub struct CliProgress {
    verbose: bool,
    config: Config,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create verbose progress
    pub const fn verbose(config: Config) -> Self {
        Self {
            verbose: true,
            config,
            spinner: Mutex::new(None),
        }
    }

    /// Create compact progress
    pub const fn compact(config: Config) -> Self {
        Self {
            verbose: false,
            config,
            spinner: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: String) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.finish_and_clear();
            }
        }
    }

    fn confirmation_text(&self, submission: &Submission) -> String {
        let Some(id) = submission.confirmation_id() else {
            return String::new();
        };
        match self.config.explorer_link(id.as_str()) {
            Some(url) => hyperlink(Stream::Stdout, id.as_str(), &url),
            None => id.to_string(),
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        if self.verbose && phase != Phase::Complete {
            println!("{}...", phase.to_string().emphasis());
        }
    }

    async fn on_queued(&self, submission: &Submission, queue_len: usize) {
        println!(
            "  {} Saved report from {} locally ({} pending)",
            check(),
            submission.engineer_id().accent(),
            queue_len.to_string().accent()
        );
    }

    async fn on_submitting(&self, submission: &Submission) {
        let message = format!(
            "Submitting report from {} captured {}",
            submission.engineer_id(),
            submission.captured_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        if self.verbose {
            self.start_spinner(message);
        } else {
            println!("  {}", message.muted());
        }
    }

    async fn on_confirmed(&self, submission: &Submission) {
        self.stop_spinner();
        println!(
            "  {} Confirmed report from {}: {}",
            check(),
            submission.engineer_id().emphasis(),
            self.confirmation_text(submission).accent()
        );
    }

    async fn on_failed(&self, submission: &Submission, error: &Error) {
        self.stop_spinner();
        eprintln!(
            "  {} Report from {} not accepted: {}",
            cross(),
            submission.engineer_id().accent().for_stderr(),
            error.to_string().error()
        );
    }

    async fn on_message(&self, message: &str) {
        self.stop_spinner();
        if self.verbose {
            println!("{}", message.warn().for_stdout());
        } else {
            println!("  {}", message.muted());
        }
    }
}
