use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    reelscout::cli::app::run().await
}
