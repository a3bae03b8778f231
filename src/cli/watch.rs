//! Watch command - stay running and send queued reports on reconnect

use crate::cli::context::Context;
use crate::cli::progress::CliProgress;
use crate::cli::style::Stylize;
use anstream::println;
use tracing::warn;
use truetrace::error::{Error, Result};
use truetrace::submit::SubmissionWorker;

/// Run the watch command until interrupted
pub async fn run_watch(ctx: &Context) -> Result<()> {
    if !ctx.has_endpoint() {
        return Err(Error::Config(
            "no submission endpoint configured; set TRUETRACE_ENDPOINT".to_string(),
        ));
    }

    let manager = ctx
        .manager(CliProgress::compact(ctx.config.clone()))
        .await?;
    println!(
        "Watching connectivity ({} queued). Press {} to stop.",
        manager.pending().len().to_string().accent(),
        "Ctrl-C".emphasis()
    );

    let (handle, task) = SubmissionWorker::spawn(manager);

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
    }
    handle.shutdown().await;

    let manager = task.await.map_err(|_| Error::WorkerStopped)?;
    println!();
    println!(
        "Stopped with {} reports queued",
        manager.pending().len().to_string().accent()
    );
    Ok(())
}
