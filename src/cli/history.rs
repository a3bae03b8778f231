//! History command - list confirmed reports

use crate::cli::context::Context;
use crate::cli::style::{Stream, Stylize, check, hyperlink};
use anstream::println;
use truetrace::error::Result;

/// Run the history command
pub async fn run_history(ctx: &Context, search: Option<&str>) -> Result<()> {
    let receipts = ctx.receipts().search(search.unwrap_or_default()).await?;

    if receipts.is_empty() {
        println!("{}", "No confirmed reports".muted());
        return Ok(());
    }

    for receipt in &receipts {
        let id = receipt.confirmation_id.as_str();
        let link = ctx
            .config
            .explorer_link(id)
            .map_or_else(|| id.to_string(), |url| hyperlink(Stream::Stdout, id, &url));
        println!(
            "{} {} {}",
            check(),
            receipt.engineer_id.accent(),
            receipt
                .confirmed_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .muted()
        );
        println!("    {link}");
        if let Some(location) = receipt.location {
            println!("    {}", location.to_string().muted());
        }
    }

    Ok(())
}
