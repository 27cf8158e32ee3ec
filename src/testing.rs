//! In-memory gateway that plays back a scripted reels page.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use cdp_adapter::{AdapterError, AdapterErrorKind, PageScript, TabGateway, TabId};
use serde_json::{json, Value};

use crate::page_scripts;

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    open_tabs: HashSet<TabId>,
    reads: usize,
    scrolls: usize,
    overlay_visible: bool,
}

pub(crate) struct FakeGateway {
    location: String,
    /// Links rendered at each read; the last batch repeats once exhausted.
    batches: Vec<Vec<String>>,
    profile_picture: Value,
    fail_on: Option<(String, AdapterErrorKind)>,
    state: Mutex<FakeState>,
}

impl FakeGateway {
    pub(crate) fn reels_page(location: &str, batches: Vec<Vec<String>>) -> Self {
        Self {
            location: location.to_string(),
            batches,
            profile_picture: json!("data:image/png;base64,AAAA"),
            fail_on: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub(crate) fn with_profile_picture(mut self, value: Value) -> Self {
        self.profile_picture = value;
        self
    }

    /// Makes every call named `call` fail with `kind`.
    pub(crate) fn failing(mut self, call: &str, kind: AdapterErrorKind) -> Self {
        self.fail_on = Some((call.to_string(), kind));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn open_tabs(&self) -> usize {
        self.state.lock().unwrap().open_tabs.len()
    }

    pub(crate) fn scrolls(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    pub(crate) fn overlay_visible(&self) -> bool {
        self.state.lock().unwrap().overlay_visible
    }

    fn record(&self, call: &str) -> Result<(), AdapterError> {
        self.state.lock().unwrap().calls.push(call.to_string());
        match &self.fail_on {
            Some((name, kind)) if name == call => {
                Err(AdapterError::new(*kind).with_hint(format!("{call} failed")))
            }
            _ => Ok(()),
        }
    }

    fn require_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        if self.state.lock().unwrap().open_tabs.contains(&tab) {
            Ok(())
        } else {
            Err(AdapterError::new(AdapterErrorKind::TabNotFound))
        }
    }
}

/// `count` distinct reel URLs starting at `from`.
pub(crate) fn reel_links(from: usize, count: usize) -> Vec<String> {
    (from..from + count)
        .map(|n| format!("https://www.instagram.com/reel/C{n:04}/"))
        .collect()
}

#[async_trait]
impl TabGateway for FakeGateway {
    async fn open_tab(&self, _url: &str, _active: bool) -> Result<TabId, AdapterError> {
        self.record("open_tab")?;
        let tab = TabId::new();
        self.state.lock().unwrap().open_tabs.insert(tab);
        Ok(tab)
    }

    async fn activate_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        self.record("activate_tab")?;
        self.require_tab(tab)
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        let removed = self.state.lock().unwrap().open_tabs.remove(&tab);
        self.record("close_tab")?;
        if removed {
            Ok(())
        } else {
            Err(AdapterError::new(AdapterErrorKind::TabNotFound))
        }
    }

    async fn inject_script(&self, tab: TabId, script: &PageScript) -> Result<(), AdapterError> {
        self.record(&format!("inject:{}", script.name()))?;
        self.require_tab(tab)
    }

    async fn call_entry_point(
        &self,
        tab: TabId,
        entry: &str,
        _args: &[Value],
    ) -> Result<Value, AdapterError> {
        self.record(entry)?;
        self.require_tab(tab)?;
        let mut state = self.state.lock().unwrap();
        let value = match entry {
            page_scripts::LOCATION => json!(self.location),
            page_scripts::REEL_LINKS => {
                let batch = match self.batches.len() {
                    0 => Vec::new(),
                    len => self.batches[state.reads.min(len - 1)].clone(),
                };
                state.reads += 1;
                json!(batch)
            }
            page_scripts::SCROLL => {
                state.scrolls += 1;
                json!(state.scrolls * 1000)
            }
            page_scripts::SHOW_OVERLAY => {
                state.overlay_visible = true;
                json!(true)
            }
            page_scripts::HIDE_OVERLAY => {
                state.overlay_visible = false;
                json!(true)
            }
            page_scripts::PROFILE_PICTURE_ENTRY => self.profile_picture.clone(),
            other => {
                return Err(AdapterError::new(AdapterErrorKind::ScriptFailed)
                    .with_hint(format!("{other} is not defined")))
            }
        };
        Ok(value)
    }
}
