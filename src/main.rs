//! truetrace - offline-first inspection report submission
//!
//! CLI binary for capturing site reports, queuing them while offline, and
//! sending them when connectivity returns.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "truetrace")]
#[command(about = "Offline-first site inspection report submission")]
#[command(version)]
struct Cli {
    /// Directory for the pending queue and receipt log
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Submission service base URL
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// Treat the device as offline without probing
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a report and submit it, or queue it while offline
    Submit(SubmitArgs),

    /// Send queued reports now
    Sync,

    /// List reports waiting to be sent
    Queue,

    /// List confirmed reports
    History {
        /// Only show receipts whose engineer or confirmation id contains this
        #[arg(long, short)]
        search: Option<String>,
    },

    /// Stay running and send queued reports whenever connectivity returns
    Watch,
}

#[derive(Args)]
struct SubmitArgs {
    /// Engineer identifier
    #[arg(long, short)]
    engineer: String,

    /// Site photo (JPEG or PNG)
    photo: PathBuf,

    /// Latitude of the capture location
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the capture location
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Skip the local image quality check
    #[arg(long)]
    skip_quality_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TRUETRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = cli::Context::load(&cli::GlobalOptions {
        data_dir: cli.data_dir,
        endpoint: cli.endpoint,
        offline: cli.offline,
    })?;

    match cli.command {
        Commands::Submit(args) => {
            let location = args.lat.zip(args.lon);
            cli::run_submit(
                &ctx,
                cli::SubmitOptions {
                    engineer: args.engineer,
                    photo: args.photo,
                    location,
                    skip_quality_check: args.skip_quality_check,
                },
            )
            .await?;
        }
        Commands::Sync => cli::run_sync(&ctx).await?,
        Commands::Queue => cli::run_queue(&ctx).await?,
        Commands::History { search } => cli::run_history(&ctx, search.as_deref()).await?,
        Commands::Watch => cli::run_watch(&ctx).await?,
    }

    Ok(())
}
