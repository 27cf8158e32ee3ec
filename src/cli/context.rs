use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::{CdpAdapter, TabGateway};
use tracing::info;

use crate::config::AppConfig;
use crate::controller::CommandRouter;
use crate::messaging::MessageChannel;
use crate::scraper::IgReelScraper;
use crate::storage::{CompletionStore, JsonFileStore};

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn store(&self) -> Arc<dyn CompletionStore> {
        Arc::new(JsonFileStore::new(self.config.store_path()))
    }

    /// Starts the browser adapter and wires scraper, router and channel on top of it.
    pub async fn session(&self) -> Result<ScrapeSession> {
        let adapter = Arc::new(CdpAdapter::new(self.config.cdp_config()));
        adapter
            .start()
            .await
            .context("Failed to start the browser adapter")?;
        info!(mode = adapter.mode().as_str(), "browser adapter ready");

        let gateway: Arc<dyn TabGateway> = adapter.clone();
        Ok(ScrapeSession::new(
            adapter,
            gateway,
            self.config.as_ref(),
            self.store(),
        ))
    }
}

pub struct ScrapeSession {
    adapter: Arc<CdpAdapter>,
    channel: MessageChannel,
}

impl ScrapeSession {
    fn new(
        adapter: Arc<CdpAdapter>,
        gateway: Arc<dyn TabGateway>,
        config: &AppConfig,
        store: Arc<dyn CompletionStore>,
    ) -> Self {
        let scraper = Arc::new(IgReelScraper::new(gateway, config.scraper_settings()));
        let router = Arc::new(CommandRouter::new(scraper));
        Self {
            adapter,
            channel: MessageChannel::new(router, store),
        }
    }

    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    pub async fn shutdown(self) {
        self.adapter.shutdown().await;
    }
}
