//! reelscout: collects reel links and the profile picture from an Instagram
//! reels page through a Chromium tab driven over CDP.

pub mod cli;
pub mod collector;
pub mod config;
pub mod controller;
pub mod errors;
pub mod messaging;
pub mod page_scripts;
pub mod scraper;
pub mod storage;
pub mod task;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{CollectorSettings, ReelCollectionResult, ReelCollector};
pub use config::AppConfig;
pub use controller::CommandRouter;
pub use errors::TaskError;
pub use messaging::{InboundMessage, InboundResponse, MessageChannel};
pub use scraper::{IgReelScraper, ScraperSettings};
pub use storage::{CompletionStore, JsonFileStore, MemoryStore, LAST_COMPLETION_KEY};
pub use task::{CommandName, TaskLogger, TaskRequest, TaskResult, TaskStatus};
