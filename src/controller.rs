//! Validates command envelopes and hands them to the scraper.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::collector::ReelCollectionResult;
use crate::errors::TaskError;
use crate::scraper::IgReelScraper;
use crate::task::{CommandName, CrawlParams, TaskRequest};
use crate::utils;

const CRAWL_REQUIRED_KEYS: &[&str] = &["taskId", CrawlParams::URL_KEY, CrawlParams::REEL_QTY_KEY];

pub struct CommandRouter {
    scraper: Arc<IgReelScraper>,
    in_flight: Mutex<()>,
}

impl CommandRouter {
    pub fn new(scraper: Arc<IgReelScraper>) -> Self {
        Self {
            scraper,
            in_flight: Mutex::new(()),
        }
    }

    /// Dispatches `req`; one task runs at a time, later callers wait their turn.
    pub async fn handle(&self, req: TaskRequest) -> Result<ReelCollectionResult, TaskError> {
        let command = match req.command.parse::<CommandName>() {
            Ok(command) => command,
            Err(err) => {
                info!(
                    target: "reelscout::controller",
                    command = %req.command,
                    task_id = %req.task_id,
                    "Unknown command received"
                );
                return Err(err);
            }
        };

        match command {
            CommandName::CrawlIgPage => {
                if let Err(err) = check_command_params(CRAWL_REQUIRED_KEYS, &req) {
                    error!(target: "reelscout::controller", %command, error = %err, "rejected request");
                    return Err(err);
                }
                if let Some(url) = req.data.get("url").and_then(Value::as_str) {
                    if !utils::is_accepted_domain(url) {
                        warn!(target: "reelscout::controller", %url, "url is outside the accepted domains");
                    }
                }

                let _guard = self.in_flight.lock().await;
                debug!(target: "reelscout::controller", task_id = %req.task_id, %command, "dispatching");
                self.scraper.collect(&req).await
            }
        }
    }
}

/// Fails with every offending key when any required key is empty or mistyped.
fn check_command_params(required: &[&str], req: &TaskRequest) -> Result<(), TaskError> {
    let envelope = serde_json::to_value(req).unwrap_or(Value::Null);
    let mut keys: Vec<String> = Vec::new();
    for key in required {
        let valid = match utils::lookup(&envelope, key) {
            Some(value) if utils::is_non_empty(value) => has_expected_type(key, value),
            _ => false,
        };
        if !valid {
            keys.push((*key).to_string());
        }
    }

    if keys.is_empty() {
        Ok(())
    } else {
        Err(TaskError::InvalidParameters {
            keys,
            request: req.to_json_string(),
        })
    }
}

fn has_expected_type(key: &str, value: &Value) -> bool {
    match key {
        CrawlParams::URL_KEY => value.as_str().map(utils::is_http_website).unwrap_or(false),
        CrawlParams::REEL_QTY_KEY => value.as_u64().map(|qty| qty >= 1).unwrap_or(false),
        _ => true,
    }
}
