//! Queue command - list reports waiting for connectivity

use crate::cli::context::Context;
use crate::cli::style::{Stylize, bullet};
use anstream::println;
use truetrace::error::Result;
use truetrace::store::{FileQueueStore, QueueStore};

/// Run the queue command
pub async fn run_queue(ctx: &Context) -> Result<()> {
    let store = FileQueueStore::new(ctx.config.queue_path());
    let pending = store.load().await?;

    if pending.is_empty() {
        println!("{}", "No queued reports".muted());
        return Ok(());
    }

    println!("{} queued reports:", pending.len().to_string().accent());
    println!();
    for submission in &pending {
        println!(
            "  {} {} {}",
            bullet(),
            submission.engineer_id().accent(),
            submission
                .captured_at()
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .muted()
        );
        println!("      id: {}", submission.id().to_string().muted());
        if let Some(location) = submission.location() {
            println!("      location: {location}");
        }
        if let Some(quality) = submission.quality() {
            println!("      quality: {}", quality.message);
        }
        if submission.attempts() > 0 {
            println!("      attempts: {}", submission.attempts());
        }
        if let Some(reason) = submission.last_error() {
            println!("      last error: {}", reason.warn().for_stdout());
        }
    }

    Ok(())
}
