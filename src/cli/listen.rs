use anyhow::{Context, Result};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::cli::context::CliContext;

/// Answers each stdin line with one JSON response line until stdin closes.
pub async fn cmd_listen(ctx: &CliContext) -> Result<()> {
    let session = ctx.session().await?;
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    let mut handled = 0usize;

    info!("Listening for messages on stdin");
    let outcome: Result<()> = async {
        while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let response = session.channel().handle_line(line).await;
            let mut encoded =
                serde_json::to_vec(&response).context("Failed to encode response")?;
            encoded.push(b'\n');
            stdout
                .write_all(&encoded)
                .await
                .context("Failed to write response")?;
            stdout.flush().await.context("Failed to flush stdout")?;
            handled += 1;
            debug!(handled, error = response.is_error(), "message answered");
        }
        Ok(())
    }
    .await;

    session.shutdown().await;
    info!(handled, "stdin closed");
    outcome
}
