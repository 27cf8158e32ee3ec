use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cdp_adapter::{AdapterError, AdapterErrorKind, PageScript, TabGateway, TabId};
use reelscout::page_scripts;
use reelscout::{
    CollectorSettings, CommandRouter, CompletionStore, IgReelScraper, InboundResponse,
    JsonFileStore, MessageChannel, ScraperSettings, LAST_COMPLETION_KEY,
};
use serde_json::{json, Value};
use tempfile::tempdir;

/// Reels page that renders a growing grid: each scroll reveals `per_scroll` more reels.
struct GrowingGrid {
    location: String,
    per_scroll: usize,
    total: usize,
    scrolls: Mutex<usize>,
    open: Mutex<Vec<TabId>>,
}

impl GrowingGrid {
    fn new(location: &str, per_scroll: usize, total: usize) -> Self {
        Self {
            location: location.to_string(),
            per_scroll,
            total,
            scrolls: Mutex::new(0),
            open: Mutex::new(Vec::new()),
        }
    }

    fn rendered(&self) -> Vec<String> {
        let visible = ((*self.scrolls.lock().unwrap() + 1) * self.per_scroll).min(self.total);
        (0..visible)
            .map(|n| format!("https://www.instagram.com/reel/R{n}/"))
            .collect()
    }
}

#[async_trait]
impl TabGateway for GrowingGrid {
    async fn open_tab(&self, _url: &str, _active: bool) -> Result<TabId, AdapterError> {
        let tab = TabId::new();
        self.open.lock().unwrap().push(tab);
        Ok(tab)
    }

    async fn activate_tab(&self, _tab: TabId) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        self.open.lock().unwrap().retain(|open| *open != tab);
        Ok(())
    }

    async fn inject_script(&self, _tab: TabId, _script: &PageScript) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn call_entry_point(
        &self,
        _tab: TabId,
        entry: &str,
        args: &[Value],
    ) -> Result<Value, AdapterError> {
        match entry {
            page_scripts::LOCATION => Ok(json!(self.location)),
            page_scripts::REEL_LINKS => Ok(json!(self.rendered())),
            page_scripts::SCROLL => {
                *self.scrolls.lock().unwrap() += 1;
                Ok(json!(0))
            }
            page_scripts::SHOW_OVERLAY | page_scripts::HIDE_OVERLAY => Ok(json!(true)),
            page_scripts::PROFILE_PICTURE_ENTRY => {
                assert_eq!(args, &[json!(48)]);
                Ok(json!("data:image/png;base64,iVBORw0KGgo="))
            }
            other => Err(AdapterError::new(AdapterErrorKind::ScriptFailed).with_hint(other)),
        }
    }
}

fn fast_settings() -> ScraperSettings {
    ScraperSettings {
        collector: CollectorSettings {
            settle_delay: Duration::ZERO,
            scroll_pause: Duration::from_millis(1),
            scroll_factor: 1.3,
            max_scrolls: 50,
        },
        profile_pic_size: 48,
    }
}

fn channel(gateway: Arc<GrowingGrid>, store: Arc<dyn CompletionStore>) -> MessageChannel {
    let scraper = Arc::new(IgReelScraper::new(gateway, fast_settings()));
    MessageChannel::new(Arc::new(CommandRouter::new(scraper)), store)
}

#[tokio::test]
async fn message_line_is_crawled_and_persisted() {
    let dir = tempdir().unwrap();
    let store_path = dir.path().join("storage.json");
    let gateway = Arc::new(GrowingGrid::new(
        "https://www.instagram.com/nasa/reels/",
        4,
        100,
    ));
    let channel = channel(gateway.clone(), Arc::new(JsonFileStore::new(&store_path)));

    let line = r#"{"command":"crawl-ig-page","data":{"url":"https://www.instagram.com/nasa/reels/","reel_qty":10}}"#;
    let response = channel.handle_line(line).await;

    let InboundResponse::Data { data } = response else {
        panic!("expected data response, got {response:?}");
    };
    assert_eq!(data.ig_reel_url_count, 10);
    assert_eq!(data.scroll_count, 3);
    assert_eq!(data.ig_reel_urls[0], "https://www.instagram.com/reel/R0/");
    assert_eq!(data.ig_reel_urls[9], "https://www.instagram.com/reel/R9/");
    assert!(!data.partial);
    assert!(gateway.open.lock().unwrap().is_empty());

    let persisted: Value = serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(persisted[LAST_COMPLETION_KEY]["ig_reel_url_count"], 10);
    assert_eq!(
        persisted[LAST_COMPLETION_KEY]["profile_pic_base64"],
        "data:image/png;base64,iVBORw0KGgo="
    );
}

#[tokio::test]
async fn short_grid_returns_partial_result() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("storage.json")));
    let gateway = Arc::new(GrowingGrid::new(
        "https://www.instagram.com/nasa/reels/",
        3,
        5,
    ));
    let channel = channel(gateway, store.clone());

    let response = channel
        .handle_line(r#"{"command":"crawl-ig-page","data":{"url":"https://www.instagram.com/nasa/reels/","reel_qty":20}}"#)
        .await;
    let InboundResponse::Data { data } = response else {
        panic!("expected data response, got {response:?}");
    };
    assert!(data.partial);
    assert_eq!(data.scroll_count, 50);
    assert_eq!(data.ig_reel_url_count, 5);

    let stored = store.get(LAST_COMPLETION_KEY).await.unwrap().unwrap();
    assert_eq!(stored["partial"], true);
}

#[tokio::test]
async fn rejected_messages_do_not_overwrite_last_completion() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("storage.json")));
    store
        .set(LAST_COMPLETION_KEY, json!({"page_url": "previous"}))
        .await
        .unwrap();
    let gateway = Arc::new(GrowingGrid::new("https://www.instagram.com/nasa/", 3, 5));
    let channel = channel(gateway, store.clone());

    let wrong_page = channel
        .handle_line(r#"{"command":"crawl-ig-page","data":{"url":"https://www.instagram.com/nasa/","reel_qty":2}}"#)
        .await;
    assert_eq!(
        wrong_page,
        InboundResponse::Error {
            error: "Invalid Instagram url provided; the url must end with '/reels'".into()
        }
    );

    let unknown = channel
        .handle_line(r#"{"command":"crawl-yt-page","data":{}}"#)
        .await;
    assert!(unknown.is_error());

    let stored = store.get(LAST_COMPLETION_KEY).await.unwrap().unwrap();
    assert_eq!(stored["page_url"], "previous");
}
