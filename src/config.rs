//! Application configuration loaded from YAML, then overridden from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use cdp_adapter::CdpConfig;
use serde::{Deserialize, Serialize};

use crate::collector::CollectorSettings;
use crate::scraper::ScraperSettings;

pub const ENV_HEADLESS: &str = "REELSCOUT_HEADLESS";
pub const ENV_CHROME: &str = "REELSCOUT_CHROME";
pub const ENV_WS_URL: &str = "REELSCOUT_WS_URL";
pub const ENV_STORE: &str = "REELSCOUT_STORE";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub browser: BrowserSettings,
    pub scraper: ScraperConfig,
    pub storage: StorageConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Chromium binary; detected when unset.
    pub executable: Option<PathBuf>,
    pub user_data_dir: PathBuf,
    pub headless: bool,
    /// Attach to an already running browser instead of launching one.
    pub websocket_url: Option<String>,
    pub command_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            user_data_dir: PathBuf::from("./.reelscout-profile"),
            headless: false,
            websocket_url: None,
            command_timeout_ms: 30_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub settle_delay_ms: u64,
    pub scroll_pause_ms: u64,
    pub scroll_factor: f64,
    pub max_scrolls: u32,
    pub profile_pic_size: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 5_000,
            scroll_pause_ms: 2_000,
            scroll_factor: 1.3,
            max_scrolls: 200,
            profile_pic_size: 35,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// Applies `REELSCOUT_*` values returned by `lookup`; blank values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(flag) = read(ENV_HEADLESS) {
            self.browser.headless = parse_bool_flag(&flag);
        }
        if let Some(path) = read(ENV_CHROME) {
            self.browser.executable = Some(PathBuf::from(path));
        }
        if let Some(url) = read(ENV_WS_URL) {
            self.browser.websocket_url = Some(url);
        }
        if let Some(path) = read(ENV_STORE) {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        let scraper = &self.scraper;
        if !(scraper.scroll_factor.is_finite() && scraper.scroll_factor > 0.0) {
            bail!("scraper.scroll_factor must be a positive number");
        }
        if scraper.max_scrolls == 0 {
            bail!("scraper.max_scrolls must be at least 1");
        }
        if scraper.profile_pic_size == 0 {
            bail!("scraper.profile_pic_size must be at least 1");
        }
        if self.browser.command_timeout_ms == 0 {
            bail!("browser.command_timeout_ms must be at least 1");
        }
        Ok(())
    }

    pub fn cdp_config(&self) -> CdpConfig {
        let mut cfg = CdpConfig::default();
        if let Some(executable) = &self.browser.executable {
            cfg.executable = executable.clone();
        }
        cfg.user_data_dir = self.browser.user_data_dir.clone();
        cfg.headless = self.browser.headless;
        cfg.websocket_url = self.browser.websocket_url.clone();
        cfg.default_deadline_ms = self.browser.command_timeout_ms;
        cfg
    }

    pub fn scraper_settings(&self) -> ScraperSettings {
        let scraper = &self.scraper;
        ScraperSettings {
            collector: CollectorSettings {
                settle_delay: Duration::from_millis(scraper.settle_delay_ms),
                scroll_pause: Duration::from_millis(scraper.scroll_pause_ms),
                scroll_factor: scraper.scroll_factor,
                max_scrolls: scraper.max_scrolls,
            },
            profile_pic_size: scraper.profile_pic_size,
        }
    }

    /// Completion store file: configured path, else the user data dir, else `./.reelscout`.
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("reelscout"))
            .unwrap_or_else(|| PathBuf::from(".reelscout"))
            .join("storage.json")
    }
}

pub fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
