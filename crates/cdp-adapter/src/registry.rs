//! Adapter registry keeping track of open tabs and their CDP sessions.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::ids::TabId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TabContext {
    pub target_id: String,
    pub cdp_session: String,
    pub opened_url: String,
}

/// Concurrent registry for tabs.
#[derive(Default)]
pub struct Registry {
    tabs: DashMap<TabId, TabContext>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tab(&self, tab: TabId, target_id: String, cdp_session: String, url: String) {
        self.tabs.insert(
            tab,
            TabContext {
                target_id,
                cdp_session,
                opened_url: url,
            },
        );
    }

    pub fn remove_tab(&self, tab: &TabId) -> Option<TabContext> {
        self.tabs.remove(tab).map(|(_, ctx)| ctx)
    }

    pub fn get(&self, tab: &TabId) -> Option<TabContext> {
        self.tabs.get(tab).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
