use clap::Subcommand;

use super::crawl::CrawlArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Collect reel links from one profile's reels page
    Crawl(CrawlArgs),

    /// Answer newline-delimited JSON messages read from stdin
    Listen,

    /// Print the last stored collection
    Last,
}
