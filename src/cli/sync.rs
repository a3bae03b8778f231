//! Sync command - drain the pending queue once

use crate::cli::context::Context;
use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, check, cross};
use anstream::{eprintln, println};
use truetrace::error::{Error, Result};

/// Run the sync command
pub async fn run_sync(ctx: &Context) -> Result<()> {
    if !ctx.has_endpoint() {
        return Err(Error::Config(
            "no submission endpoint configured; set TRUETRACE_ENDPOINT".to_string(),
        ));
    }

    let mut manager = ctx
        .manager(CliProgress::verbose(ctx.config.clone()))
        .await?;

    if manager.pending().is_empty() {
        println!("{}", "No queued reports".muted());
        return Ok(());
    }
    if !manager.connectivity().is_online() {
        let notice = format!(
            "Offline: {} reports stay queued until the connection returns",
            manager.pending().len()
        );
        println!("{}", notice.warn().for_stdout());
        return Ok(());
    }

    let report = manager.on_connectivity_restored().await?;

    println!();
    if !report.confirmed.is_empty() {
        println!(
            "{} Sent {} queued reports",
            check(),
            report.confirmed.len().to_string().accent()
        );
    }
    for failure in &report.failed {
        eprintln!(
            "{} {} {}",
            cross(),
            failure.submission_id.to_string().muted().for_stderr(),
            failure.reason.error()
        );
    }
    if report.remaining > 0 {
        println!(
            "{} reports remain queued",
            report.remaining.to_string().accent()
        );
    }

    Ok(())
}
