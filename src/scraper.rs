//! Runs one reels crawl from tab open to tab close.

use std::sync::Arc;
use std::time::Duration;

use cdp_adapter::{ScriptParams, TabGateway, TabId};
use serde_json::Value;
use tracing::{info, warn};

use crate::collector::{unexpected_payload, CollectorSettings, ReelCollectionResult, ReelCollector};
use crate::errors::TaskError;
use crate::page_scripts::PROFILE_PICTURE;
use crate::task::{CrawlParams, TaskLogger, TaskRequest};

#[derive(Clone, Debug, PartialEq)]
pub struct ScraperSettings {
    pub collector: CollectorSettings,
    /// Larger side, in pixels, of the returned profile picture.
    pub profile_pic_size: u32,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            collector: CollectorSettings::default(),
            profile_pic_size: 35,
        }
    }
}

pub struct IgReelScraper {
    gateway: Arc<dyn TabGateway>,
    settings: ScraperSettings,
    logger: TaskLogger,
}

impl IgReelScraper {
    pub fn new(gateway: Arc<dyn TabGateway>, settings: ScraperSettings) -> Self {
        Self {
            gateway,
            settings,
            logger: TaskLogger::new(),
        }
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Crawls the reels page named by `req` and logs the outcome as a task record.
    pub async fn collect(&self, req: &TaskRequest) -> Result<ReelCollectionResult, TaskError> {
        let outcome = self.crawl(req).await;
        match &outcome {
            Ok(result) => {
                info!(
                    target: "reelscout::scraper",
                    task_id = %req.task_id,
                    reels = result.ig_reel_url_count,
                    scroll_count = result.scroll_count,
                    "IG reels collected"
                );
                self.logger.log_success(result, &req.task_id, &req.command);
            }
            Err(err) => {
                warn!(
                    target: "reelscout::scraper",
                    task_id = %req.task_id,
                    code = err.code(),
                    "IG reel collection failed"
                );
                self.logger.log_failure(err, &req.task_id, &req.command);
            }
        }
        outcome
    }

    async fn crawl(&self, req: &TaskRequest) -> Result<ReelCollectionResult, TaskError> {
        let params = CrawlParams::from_request(req)?;
        let tab = self.gateway.open_and_activate(&params.url).await?;
        info!(target: "reelscout::scraper", %tab, url = %params.url, "tab opened");

        let outcome = self.collect_in_tab(tab, &params).await;
        if let Err(err) = self.gateway.close_tab(tab).await {
            warn!(target: "reelscout::scraper", %tab, error = %err, "failed to close tab");
        }
        outcome
    }

    async fn collect_in_tab(
        &self,
        tab: TabId,
        params: &CrawlParams,
    ) -> Result<ReelCollectionResult, TaskError> {
        let mut result = ReelCollector::new(self.gateway.as_ref(), &self.settings.collector)
            .collect(tab, params.reel_qty)
            .await?;
        result.profile_pic_base64 = self.profile_picture(tab).await?;
        Ok(result)
    }

    async fn profile_picture(&self, tab: TabId) -> Result<Option<String>, TaskError> {
        let params = ScriptParams::new().with("size", self.settings.profile_pic_size);
        let value = self
            .gateway
            .inject_and_run(tab, &PROFILE_PICTURE, &params, Duration::ZERO)
            .await?;
        match value {
            Value::Null => Ok(None),
            Value::String(data_url) => Ok(Some(data_url)),
            other => Err(unexpected_payload(PROFILE_PICTURE.entry_point(), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_scripts;
    use crate::testing::{reel_links, FakeGateway};
    use cdp_adapter::AdapterErrorKind;
    use serde_json::json;

    const REELS: &str = "https://www.instagram.com/nasa/reels/";

    fn scraper(gateway: &Arc<FakeGateway>) -> IgReelScraper {
        IgReelScraper::new(gateway.clone(), ScraperSettings::default())
    }

    fn request(qty: u64) -> TaskRequest {
        TaskRequest::crawl("task-1", REELS, qty)
    }

    #[tokio::test(start_paused = true)]
    async fn merges_profile_picture_and_closes_tab() {
        let gateway = Arc::new(FakeGateway::reels_page(REELS, vec![reel_links(0, 5)]));
        let result = scraper(&gateway).collect(&request(3)).await.unwrap();

        assert_eq!(result.ig_reel_url_count, 3);
        assert_eq!(
            result.profile_pic_base64.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(gateway.open_tabs(), 0);
        assert_eq!(gateway.calls().last().map(String::as_str), Some("close_tab"));
    }

    #[tokio::test(start_paused = true)]
    async fn steps_run_in_order() {
        let gateway = Arc::new(FakeGateway::reels_page(REELS, vec![reel_links(0, 1)]));
        scraper(&gateway).collect(&request(1)).await.unwrap();

        let calls = gateway.calls();
        let position = |name: &str| calls.iter().position(|c| c == name).unwrap();
        assert_eq!(calls[0], "open_tab");
        assert_eq!(calls[1], "activate_tab");
        assert!(position("inject:collect_reels") < position(page_scripts::HIDE_OVERLAY));
        assert!(position(page_scripts::HIDE_OVERLAY) < position("inject:profile_picture"));
        assert!(position("inject:profile_picture") < position(page_scripts::PROFILE_PICTURE_ENTRY));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_profile_picture_is_null() {
        let gateway = Arc::new(
            FakeGateway::reels_page(REELS, vec![reel_links(0, 2)]).with_profile_picture(Value::Null),
        );
        let result = scraper(&gateway).collect(&request(2)).await.unwrap();
        assert!(result.profile_pic_base64.is_none());
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["profile_pic_base64"].is_null());
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_page_still_closes_tab() {
        let gateway = Arc::new(FakeGateway::reels_page("https://www.instagram.com/nasa/", vec![]));
        let err = scraper(&gateway).collect(&request(2)).await.unwrap_err();

        assert_eq!(err, TaskError::invalid_page());
        assert_eq!(gateway.open_tabs(), 0);
        assert!(!gateway.calls().iter().any(|c| c == "inject:profile_picture"));
    }

    #[tokio::test(start_paused = true)]
    async fn profile_picture_failure_still_closes_tab() {
        let gateway = Arc::new(
            FakeGateway::reels_page(REELS, vec![reel_links(0, 2)])
                .failing(page_scripts::PROFILE_PICTURE_ENTRY, AdapterErrorKind::ScriptFailed),
        );
        let err = scraper(&gateway).collect(&request(2)).await.unwrap_err();
        assert!(matches!(err, TaskError::ScriptExecutionFailed(_)));
        assert_eq!(gateway.open_tabs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_profile_picture_payload_is_rejected() {
        let gateway = Arc::new(
            FakeGateway::reels_page(REELS, vec![reel_links(0, 1)]).with_profile_picture(json!(42)),
        );
        let err = scraper(&gateway).collect(&request(1)).await.unwrap_err();
        assert!(matches!(err, TaskError::ScriptExecutionFailed(msg) if msg.contains("42")));
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_maps_to_tab_operation() {
        let gateway = Arc::new(
            FakeGateway::reels_page(REELS, vec![]).failing("open_tab", AdapterErrorKind::CdpIo),
        );
        let err = scraper(&gateway).collect(&request(1)).await.unwrap_err();
        assert!(matches!(err, TaskError::TabOperationFailed(_)));
        assert!(!gateway.calls().iter().any(|c| c == "close_tab"));
    }

    #[tokio::test(start_paused = true)]
    async fn close_failure_does_not_replace_outcome() {
        let gateway = Arc::new(
            FakeGateway::reels_page(REELS, vec![reel_links(0, 1)])
                .failing("close_tab", AdapterErrorKind::CdpIo),
        );
        let result = scraper(&gateway).collect(&request(1)).await.unwrap();
        assert_eq!(result.ig_reel_url_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_request_without_crawl_params() {
        let gateway = Arc::new(FakeGateway::reels_page(REELS, vec![]));
        let req = TaskRequest::new("task-1", "crawl-ig-page", json!({}));
        let err = scraper(&gateway).collect(&req).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidParameters { .. }));
        assert!(gateway.calls().is_empty());
    }
}
