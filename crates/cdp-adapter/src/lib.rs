//! reelscout CDP adapter.
//!
//! This crate exposes the [`TabGateway`] capability surface the scraper is written
//! against (open, activate and close tabs; inject page scripts and call their entry
//! points) together with [`CdpAdapter`], the Chromium DevTools Protocol implementation
//! that drives it through a pluggable [`CdpTransport`].

use std::{env, path::PathBuf};
use which::which;

pub mod ids {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use uuid::Uuid;

    /// Unique identifier for a tab opened through the gateway.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
    pub struct TabId(pub Uuid);

    impl TabId {
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }

    impl Default for TabId {
        fn default() -> Self {
            Self::new()
        }
    }

    impl fmt::Display for TabId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }
}

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the adapter.
    #[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("command timed out")]
        Timeout,
        #[error("tab not found")]
        TabNotFound,
        #[error("script execution failed")]
        ScriptFailed,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
        pub retriable: bool,
        pub data: Option<serde_json::Value>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self {
                kind,
                hint: None,
                retriable: false,
                data: None,
            }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn retriable(mut self, flag: bool) -> Self {
            self.retriable = flag;
            self
        }

        pub fn with_data(mut self, data: serde_json::Value) -> Self {
            self.data = Some(data);
            self
        }

        pub fn is_script_failure(&self) -> bool {
            self.kind == AdapterErrorKind::ScriptFailed
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    /// Configuration for launching and tuning the adapter.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct CdpConfig {
        pub executable: PathBuf,
        pub user_data_dir: PathBuf,
        pub headless: bool,
        pub default_deadline_ms: u64,
        pub websocket_url: Option<String>,
    }

    impl Default for CdpConfig {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable().unwrap_or_default(),
                user_data_dir: PathBuf::from("./.reelscout-profile"),
                // Collection relies on a rendered, scrollable viewport.
                headless: false,
                default_deadline_ms: 30_000,
                websocket_url: None,
            }
        }
    }
}

/// Which transport the adapter ended up with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AdapterMode {
    Real,
    Stub,
}

impl AdapterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterMode::Real => "real",
            AdapterMode::Stub => "stub",
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, AdapterMode::Stub)
    }
}

const CHROME_BINARIES: &[&str] = &["google-chrome", "chromium", "chromium-browser", "chrome"];

/// `REELSCOUT_CHROME`, then `PATH`, then the usual install location for this OS.
pub(crate) fn detect_chrome_executable() -> Option<PathBuf> {
    let from_env = env::var("REELSCOUT_CHROME")
        .ok()
        .map(|raw| PathBuf::from(raw.trim()))
        .filter(|path| !path.as_os_str().is_empty() && path.exists());
    if from_env.is_some() {
        return from_env;
    }

    if let Some(path) = CHROME_BINARIES.iter().find_map(|name| which(name).ok()) {
        return Some(path);
    }

    let skip_install_dirs = env::var("REELSCOUT_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);
    if skip_install_dirs {
        return None;
    }
    install_locations().into_iter().find(|path| path.exists())
}

fn install_locations() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else if cfg!(target_os = "windows") {
        env::var("PROGRAMFILES")
            .map(|root| vec![PathBuf::from(root).join("Google/Chrome/Application/chrome.exe")])
            .unwrap_or_default()
    } else {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }
}


pub mod adapter;
pub mod metrics;
pub mod registry;
pub mod script;
pub mod transport;
pub mod util;

pub use adapter::{CdpAdapter, TabGateway};
pub use config::CdpConfig;
pub use error::{AdapterError, AdapterErrorKind};
pub use ids::TabId;
pub use metrics::AdapterMetricsSnapshot;
pub use script::{PageScript, ScriptParams};
pub use transport::{CdpTransport, ChromiumTransport, CommandTarget, NoopTransport};
