use anyhow::{Context, Result};

use crate::cli::context::CliContext;
use crate::storage::LAST_COMPLETION_KEY;

pub async fn cmd_last(ctx: &CliContext) -> Result<()> {
    let store = ctx.store();
    match store
        .get(LAST_COMPLETION_KEY)
        .await
        .context("Failed to read the completion store")?
    {
        Some(value) => {
            let rendered =
                serde_json::to_string_pretty(&value).context("Failed to encode completion")?;
            println!("{rendered}");
        }
        None => println!("No completed collection stored yet."),
    }
    Ok(())
}
