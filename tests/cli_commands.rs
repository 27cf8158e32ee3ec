use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::tempdir;

fn reelscout() -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("reelscout");
    let mut cmd = Command::new(bin);
    cmd.env_remove("RUST_LOG")
        .env_remove("REELSCOUT_WS_URL")
        .env_remove("REELSCOUT_CHROME");
    cmd
}

#[test]
fn last_reports_empty_store() {
    let dir = tempdir().unwrap();
    let assert = reelscout()
        .env("REELSCOUT_STORE", dir.path().join("storage.json"))
        .args(["--config", dir.path().join("none.yaml").to_str().unwrap(), "last"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert_eq!(stdout.trim(), "No completed collection stored yet.");
}

#[test]
fn last_prints_stored_completion() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("storage.json");
    std::fs::write(
        &store,
        r#"{"lastCompletion":{"page_url":"https://www.instagram.com/nasa/reels/","scroll_count":2,"ig_reel_urls":["https://www.instagram.com/reel/A/"],"ig_reel_url_count":1,"profile_pic_base64":null}}"#,
    )
    .unwrap();

    let assert = reelscout()
        .env("REELSCOUT_STORE", &store)
        .args(["--config", dir.path().join("none.yaml").to_str().unwrap(), "last"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert_eq!(value["scroll_count"].as_u64(), Some(2));
    assert_eq!(value["ig_reel_url_count"].as_u64(), Some(1));
}

#[test]
fn crawl_requires_a_target() {
    reelscout()
        .args(["crawl", "--reel-qty", "3"])
        .assert()
        .failure();
}

#[test]
fn zero_quantity_is_rejected_before_launch() {
    let dir = tempdir().unwrap();
    let assert = reelscout()
        .env("REELSCOUT_STORE", dir.path().join("storage.json"))
        .env("REELSCOUT_CHROME", dir.path().join("no-such-chrome"))
        .args([
            "--config",
            dir.path().join("none.yaml").to_str().unwrap(),
            "crawl",
            "--username",
            "nasa",
            "-n",
            "0",
        ])
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    let value: Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert!(value["error"].as_str().unwrap().contains("data.reel_qty"));
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 output");
    assert!(!stderr.contains("no-such-chrome"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("reelscout.yaml");
    std::fs::write(&config, "scraper:\n  max_scrolls: 0\n").unwrap();

    let assert = reelscout()
        .env("REELSCOUT_STORE", dir.path().join("storage.json"))
        .args(["--config", config.to_str().unwrap(), "last"])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 output");
    assert!(stderr.contains("max_scrolls"));
}
