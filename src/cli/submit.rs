//! Submit command - capture a report and send or queue it

use crate::cli::context::Context;
use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, check};
use anstream::{eprintln, println};
use std::path::PathBuf;
use truetrace::error::{Error, Result};
use truetrace::quality::{HeuristicQualityChecker, QualityChecker};
use truetrace::types::{Draft, FinalizeOutcome, ImagePayload, Location};

/// Inputs for one report
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Engineer identifier
    pub engineer: String,
    /// Path of the site photo
    pub photo: PathBuf,
    /// Latitude and longitude
    pub location: Option<(f64, f64)>,
    /// Skip the advisory quality check
    pub skip_quality_check: bool,
}

/// Run the submit command
pub async fn run_submit(ctx: &Context, options: SubmitOptions) -> Result<()> {
    let bytes = tokio::fs::read(&options.photo).await.map_err(|e| {
        Error::Validation(format!("cannot read {}: {e}", options.photo.display()))
    })?;
    let image = ImagePayload::from_bytes(bytes)?;

    let quality = if options.skip_quality_check {
        None
    } else {
        let assessment = HeuristicQualityChecker::default().check(&image).await;
        if assessment.acceptable {
            println!("{} {}", check(), assessment.message.muted());
        } else {
            eprintln!("{}", assessment.message.warn());
        }
        Some(assessment)
    };

    let mut draft = Draft::new(options.engineer, Some(image));
    if let Some((lat, lon)) = options.location {
        draft = draft.with_location(Location::new(lat, lon)?);
    }
    if let Some(assessment) = quality {
        draft = draft.with_quality(assessment);
    }

    let mut manager = ctx
        .manager(CliProgress::verbose(ctx.config.clone()))
        .await?;

    match manager.finalize(draft).await? {
        FinalizeOutcome::QueuedLocally(_) => {
            if !ctx.has_endpoint() {
                println!(
                    "{}",
                    "No endpoint configured; set TRUETRACE_ENDPOINT to send queued reports"
                        .muted()
                );
            }
        }
        FinalizeOutcome::Confirmed(submission) => {
            println!();
            println!(
                "{} Report {} confirmed",
                check(),
                submission.id().to_string().muted()
            );
        }
        FinalizeOutcome::SubmissionFailed { submission, .. } => {
            let queued = manager.requeue(submission).await?;
            println!(
                "Report {} queued; run {} to try again",
                queued.id().to_string().muted(),
                "truetrace sync".accent()
            );
        }
    }

    Ok(())
}
