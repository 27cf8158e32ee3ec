use super::crawl::cmd_crawl;
use super::env::CliArgs;
use super::last::cmd_last;
use super::listen::cmd_listen;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Crawl(args) => cmd_crawl(args, ctx).await,
        Commands::Listen => cmd_listen(ctx).await,
        Commands::Last => cmd_last(ctx).await,
    }
}
