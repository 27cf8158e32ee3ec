//! Scroll-and-collect loop over the reel page helpers.

use std::collections::HashSet;
use std::time::Duration;

use cdp_adapter::{TabGateway, TabId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::TaskError;
use crate::page_scripts::{self, REEL_COLLECTION};

/// Result of one reels collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReelCollectionResult {
    pub page_url: String,
    pub scroll_count: u32,
    pub ig_reel_urls: Vec<String>,
    pub ig_reel_url_count: usize,
    pub profile_pic_base64: Option<String>,
    /// Set when the scroll ceiling stopped the loop before `reel_qty` links were seen.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollectorSettings {
    pub settle_delay: Duration,
    pub scroll_pause: Duration,
    /// Viewport heights per scroll step.
    pub scroll_factor: f64,
    pub max_scrolls: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(5_000),
            scroll_pause: Duration::from_millis(2_000),
            scroll_factor: 1.3,
            max_scrolls: 200,
        }
    }
}

/// Insertion-ordered set of reel URLs.
#[derive(Debug, Default)]
pub struct ReelLinkSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl ReelLinkSet {
    /// Adds unseen links in order; returns how many were new.
    pub fn extend<I: IntoIterator<Item = String>>(&mut self, links: I) -> usize {
        let before = self.order.len();
        for link in links {
            if self.seen.insert(link.clone()) {
                self.order.push(link);
            }
        }
        self.order.len() - before
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

pub struct ReelCollector<'a> {
    gateway: &'a dyn TabGateway,
    settings: &'a CollectorSettings,
}

impl<'a> ReelCollector<'a> {
    pub fn new(gateway: &'a dyn TabGateway, settings: &'a CollectorSettings) -> Self {
        Self { gateway, settings }
    }

    /// Collects up to `reel_qty` distinct reel links from the page in `tab`.
    ///
    /// `profile_pic_base64` is left empty for the caller to fill.
    pub async fn collect(
        &self,
        tab: TabId,
        reel_qty: usize,
    ) -> Result<ReelCollectionResult, TaskError> {
        self.gateway.activate_tab(tab).await?;
        if !self.settings.settle_delay.is_zero() {
            sleep(self.settings.settle_delay).await;
        }
        self.gateway.inject_script(tab, &REEL_COLLECTION).await?;

        let page_url = self.location(tab).await?;
        if !page_url.contains("/reels/") {
            warn!(target: "reelscout::collector", %page_url, "tab is not on a reels listing");
            return Err(TaskError::invalid_page());
        }

        self.call(tab, page_scripts::SHOW_OVERLAY, &[json!(page_scripts::OVERLAY_MESSAGE)])
            .await?;
        let outcome = self.scroll_until(tab, reel_qty).await;
        if let Err(err) = self.call(tab, page_scripts::HIDE_OVERLAY, &[]).await {
            warn!(target: "reelscout::collector", error = %err, "failed to remove overlay");
        }
        let (links, scroll_count, partial) = outcome?;

        let mut ig_reel_urls = links.into_vec();
        ig_reel_urls.truncate(reel_qty);
        info!(
            target: "reelscout::collector",
            %page_url,
            scroll_count,
            collected = ig_reel_urls.len(),
            partial,
            "reel collection finished"
        );
        Ok(ReelCollectionResult {
            page_url,
            scroll_count,
            ig_reel_url_count: ig_reel_urls.len(),
            ig_reel_urls,
            profile_pic_base64: None,
            partial,
        })
    }

    async fn scroll_until(
        &self,
        tab: TabId,
        reel_qty: usize,
    ) -> Result<(ReelLinkSet, u32, bool), TaskError> {
        let mut links = ReelLinkSet::default();
        let mut scroll_count = 0u32;
        while links.len() < reel_qty {
            if scroll_count >= self.settings.max_scrolls {
                warn!(
                    target: "reelscout::collector",
                    max_scrolls = self.settings.max_scrolls,
                    collected = links.len(),
                    reel_qty,
                    "scroll ceiling reached before enough reels were found"
                );
                return Ok((links, scroll_count, true));
            }
            let added = links.extend(self.rendered_links(tab).await?);
            self.call(tab, page_scripts::SCROLL, &[json!(self.settings.scroll_factor)])
                .await?;
            scroll_count += 1;
            debug!(
                target: "reelscout::collector",
                scroll_count,
                added,
                collected = links.len(),
                "scrolled"
            );
            sleep(self.settings.scroll_pause).await;
        }
        Ok((links, scroll_count, false))
    }

    async fn location(&self, tab: TabId) -> Result<String, TaskError> {
        match self.call(tab, page_scripts::LOCATION, &[]).await? {
            Value::String(href) => Ok(href),
            other => Err(unexpected_payload(page_scripts::LOCATION, &other)),
        }
    }

    async fn rendered_links(&self, tab: TabId) -> Result<Vec<String>, TaskError> {
        let value = self.call(tab, page_scripts::REEL_LINKS, &[]).await?;
        serde_json::from_value(value.clone())
            .map_err(|_| unexpected_payload(page_scripts::REEL_LINKS, &value))
    }

    async fn call(&self, tab: TabId, entry: &str, args: &[Value]) -> Result<Value, TaskError> {
        Ok(self.gateway.call_entry_point(tab, entry, args).await?)
    }
}

pub(crate) fn unexpected_payload(entry: &str, value: &Value) -> TaskError {
    TaskError::ScriptExecutionFailed(format!("unexpected result from {entry}: {value}"))
}
