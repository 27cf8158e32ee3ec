use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::CdpConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::ids::TabId;
use crate::metrics::{self, AdapterMetricsSnapshot};
use crate::registry::{Registry, TabContext};
use crate::script::{entry_point_expression, PageScript, ScriptParams};
use crate::transport::{CdpTransport, ChromiumTransport, CommandTarget, NoopTransport};
use crate::{detect_chrome_executable, AdapterMode};

/// Tab lifecycle and page-script capability surface the scraper is written against.
#[async_trait]
pub trait TabGateway: Send + Sync {
    async fn open_tab(&self, url: &str, active: bool) -> Result<TabId, AdapterError>;

    async fn activate_tab(&self, tab: TabId) -> Result<(), AdapterError>;

    /// Closes the tab; the gateway forgets it even when the host reports an error.
    async fn close_tab(&self, tab: TabId) -> Result<(), AdapterError>;

    /// Evaluates the script source in the tab, installing its globals.
    async fn inject_script(&self, tab: TabId, script: &PageScript) -> Result<(), AdapterError>;

    /// Invokes `window[entry](...args)` and returns its (awaited) value.
    ///
    /// A JS `null` is a valid result; a thrown error or a missing result is
    /// reported as [`AdapterErrorKind::ScriptFailed`].
    async fn call_entry_point(
        &self,
        tab: TabId,
        entry: &str,
        args: &[Value],
    ) -> Result<Value, AdapterError>;

    /// Opens a background tab and brings it to the foreground.
    ///
    /// The tab is closed again if activation fails.
    async fn open_and_activate(&self, url: &str) -> Result<TabId, AdapterError> {
        let tab = self.open_tab(url, false).await?;
        if let Err(err) = self.activate_tab(tab).await {
            if let Err(close_err) = self.close_tab(tab).await {
                warn!(target: "cdp-adapter", %tab, ?close_err, "failed to close tab after activation error");
            }
            return Err(err);
        }
        Ok(tab)
    }

    /// Activates the tab, waits `delay`, injects `script` and runs its entry point
    /// with the values of `params` as positional arguments.
    async fn inject_and_run(
        &self,
        tab: TabId,
        script: &PageScript,
        params: &ScriptParams,
        delay: Duration,
    ) -> Result<Value, AdapterError> {
        self.activate_tab(tab).await?;
        if !delay.is_zero() {
            sleep(delay).await;
        }
        self.inject_script(tab, script).await?;
        self.call_entry_point(tab, script.entry_point(), &params.values())
            .await
    }
}

/// [`TabGateway`] implementation over the Chrome DevTools Protocol.
pub struct CdpAdapter {
    pub cfg: CdpConfig,
    registry: Arc<Registry>,
    mode: AdapterMode,
    transport: Arc<dyn CdpTransport>,
    started: OnceCell<()>,
}

impl CdpAdapter {
    /// Picks the Chromium transport when a websocket URL or executable is configured,
    /// otherwise detects one or falls back to the no-op transport.
    ///
    /// A configured executable is kept even when missing so `start` reports its path.
    pub fn new(mut cfg: CdpConfig) -> Self {
        let use_real = if cfg.websocket_url.is_some() || !cfg.executable.as_os_str().is_empty() {
            true
        } else if let Some(path) = detect_chrome_executable() {
            cfg.executable = path;
            true
        } else {
            false
        };

        let transport: Arc<dyn CdpTransport> = if use_real {
            info!(target: "cdp-adapter", "using real Chromium transport");
            Arc::new(ChromiumTransport::new(cfg.clone()))
        } else {
            warn!(
                target: "cdp-adapter",
                event = "cdp_adapter.stub_mode",
                mode = %AdapterMode::Stub.as_str(),
                remediation = "Install Chrome/Chromium and set REELSCOUT_CHROME=/path/to/chrome or pass --chrome-path/--ws-url",
                "CDP adapter initialized without a browser; every tab operation will fail"
            );
            Arc::new(NoopTransport)
        };
        Self::with_transport(cfg, transport)
    }

    pub fn with_transport(cfg: CdpConfig, transport: Arc<dyn CdpTransport>) -> Self {
        let mode = transport.adapter_mode();
        Self {
            cfg,
            registry: Arc::new(Registry::new()),
            mode,
            transport,
            started: OnceCell::new(),
        }
    }

    pub fn mode(&self) -> AdapterMode {
        self.mode
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Starts the transport once; later calls are no-ops.
    pub async fn start(&self) -> Result<(), AdapterError> {
        self.started
            .get_or_try_init(|| async {
                self.transport.start().await?;
                info!(target: "cdp-adapter", mode = self.mode.as_str(), "adapter started");
                Ok::<(), AdapterError>(())
            })
            .await
            .map(|_| ())
    }

    /// Process-wide command and tab counters.
    pub fn metrics(&self) -> AdapterMetricsSnapshot {
        metrics::snapshot()
    }

    /// Warns about tabs still registered, logs the counters and tears the transport down.
    pub async fn shutdown(&self) {
        let leftover = self.registry.len();
        if leftover > 0 {
            warn!(target: "cdp-adapter", leftover, "shutting down with open tabs");
        }
        let snap = self.metrics();
        info!(
            target: "cdp-adapter",
            commands = snap.commands,
            failures = snap.command_failures,
            tabs_opened = snap.tabs_opened,
            tabs_closed = snap.tabs_closed,
            latency_total_us = snap.command_latency_total_us,
            "adapter metrics"
        );
        self.transport.shutdown().await;
    }

    fn tab_context(&self, tab: TabId) -> Result<TabContext, AdapterError> {
        self.registry.get(&tab).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::TabNotFound).with_hint(format!("unknown tab {tab}"))
        })
    }

    async fn send_browser_command(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        self.dispatch(CommandTarget::Browser, method, params).await
    }

    async fn send_tab_command(
        &self,
        tab: TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        let ctx = self.tab_context(tab)?;
        self.dispatch(CommandTarget::Session(ctx.cdp_session), method, params)
            .await
    }

    async fn dispatch(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, AdapterError> {
        let start = Instant::now();
        metrics::record_command(method);
        match self.transport.send_command(target, method, params).await {
            Ok(value) => {
                metrics::record_command_success(method, start.elapsed());
                Ok(value)
            }
            Err(err) => {
                metrics::record_command_failure(method);
                Err(err)
            }
        }
    }

    async fn evaluate(
        &self,
        tab: TabId,
        expression: &str,
        await_promise: bool,
    ) -> Result<Value, AdapterError> {
        let response = self
            .send_tab_command(
                tab,
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "awaitPromise": await_promise,
                    "returnByValue": true,
                    "userGesture": true,
                }),
            )
            .await?;

        if let Some(details) = response.get("exceptionDetails") {
            let message = details
                .get("exception")
                .and_then(|exc| exc.get("description"))
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("script raised an exception")
                .to_string();
            return Err(AdapterError::new(AdapterErrorKind::ScriptFailed)
                .with_hint(message)
                .with_data(details.clone()));
        }

        let result = response.get("result").ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::ScriptFailed)
                .with_hint("no results from script execution")
        })?;

        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl TabGateway for CdpAdapter {
    async fn open_tab(&self, url: &str, active: bool) -> Result<TabId, AdapterError> {
        let created = self
            .send_browser_command(
                "Target.createTarget",
                json!({ "url": url, "background": !active }),
            )
            .await?;
        let target_id = created
            .get("targetId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint("createTarget missing targetId")
            })?
            .to_string();

        let attached = self
            .send_browser_command(
                "Target.attachToTarget",
                json!({ "targetId": target_id, "flatten": true }),
            )
            .await?;
        let session = attached
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AdapterError::new(AdapterErrorKind::Internal)
                    .with_hint("attachToTarget missing sessionId")
            })?
            .to_string();

        let tab = TabId::new();
        self.registry
            .insert_tab(tab, target_id.clone(), session, url.to_string());
        metrics::record_tab_opened();
        info!(target: "cdp-adapter", %tab, target = %target_id, url, active, "tab opened");
        Ok(tab)
    }

    async fn activate_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        let ctx = self.tab_context(tab)?;
        self.send_browser_command(
            "Target.activateTarget",
            json!({ "targetId": ctx.target_id }),
        )
        .await?;
        debug!(target: "cdp-adapter", %tab, "tab activated");
        Ok(())
    }

    async fn close_tab(&self, tab: TabId) -> Result<(), AdapterError> {
        let ctx = self.registry.remove_tab(&tab).ok_or_else(|| {
            AdapterError::new(AdapterErrorKind::TabNotFound).with_hint(format!("unknown tab {tab}"))
        })?;
        metrics::record_tab_closed();
        self.send_browser_command("Target.closeTarget", json!({ "targetId": ctx.target_id }))
            .await?;
        info!(target: "cdp-adapter", %tab, "tab closed");
        Ok(())
    }

    async fn inject_script(&self, tab: TabId, script: &PageScript) -> Result<(), AdapterError> {
        self.evaluate(tab, script.source(), false).await?;
        debug!(target: "cdp-adapter", %tab, script = script.name(), "script injected");
        Ok(())
    }

    async fn call_entry_point(
        &self,
        tab: TabId,
        entry: &str,
        args: &[Value],
    ) -> Result<Value, AdapterError> {
        let expression = entry_point_expression(entry, args).map_err(|err| {
            AdapterError::new(AdapterErrorKind::Internal).with_hint(err.to_string())
        })?;
        self.evaluate(tab, &expression, true).await
    }
}
