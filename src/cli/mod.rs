pub mod app;
pub mod commands;
pub mod context;
pub mod crawl;
pub mod dispatch;
pub mod env;
pub mod last;
pub mod listen;
pub mod runtime;

pub use context::{CliContext, ScrapeSession};
pub use crawl::{cmd_crawl, CrawlArgs};
pub use last::cmd_last;
pub use listen::cmd_listen;
