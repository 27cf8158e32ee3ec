//! Contract tests that drive a real Chromium binary through the tab gateway.
//! They are ignored by default because they require Chrome/Chromium on the host.

use std::env;
use std::time::Duration;

use cdp_adapter::{CdpAdapter, CdpConfig, PageScript, ScriptParams, TabGateway};
use serde_json::json;
use tempfile::TempDir;

const ECHO: PageScript = PageScript::new(
    "echo.js",
    "window.reelscoutEcho = async (a, b) => ({ href: location.href, args: [a, b] });",
    "reelscoutEcho",
);

fn contract_enabled() -> bool {
    env::var("REELSCOUT_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

fn test_config() -> (CdpConfig, TempDir) {
    let profile = tempfile::tempdir().expect("create temporary chrome profile");
    let cfg = CdpConfig {
        headless: true,
        user_data_dir: profile.path().into(),
        ..CdpConfig::default()
    };
    (cfg, profile)
}

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set REELSCOUT_CDP_CONTRACT=1"]
async fn contract_tab_lifecycle_and_script_call() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (REELSCOUT_CDP_CONTRACT not enabled)");
        return;
    }

    let (cfg, _profile) = test_config();
    let adapter = CdpAdapter::new(cfg);
    adapter.start().await.expect("adapter start");

    let tab = adapter
        .open_and_activate("about:blank")
        .await
        .expect("open and activate");

    let params = ScriptParams::new().with("a", 1).with("b", "two");
    let value = adapter
        .inject_and_run(tab, &ECHO, &params, Duration::from_millis(500))
        .await
        .expect("inject and run");
    assert_eq!(value["args"], json!([1, "two"]));
    assert_eq!(value["href"], json!("about:blank"));

    let missing = adapter.call_entry_point(tab, "reelscoutMissing", &[]).await;
    assert!(missing.unwrap_err().is_script_failure());

    adapter.close_tab(tab).await.expect("close tab");
    assert!(adapter.registry().is_empty());
    adapter.shutdown().await;
}
