//! Inbound `{command, data}` messages and their `{data}` / `{error}` replies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::collector::ReelCollectionResult;
use crate::controller::CommandRouter;
use crate::storage::{CompletionStore, LAST_COMPLETION_KEY};
use crate::task::TaskRequest;
use crate::utils;

/// Fields of an inbound `data` object forwarded to the router.
const FORWARDED_KEYS: &[&str] = &["url", "reel_qty"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundResponse {
    Data { data: ReelCollectionResult },
    Error { error: String },
}

impl InboundResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, InboundResponse::Error { .. })
    }
}

pub struct MessageChannel {
    router: Arc<CommandRouter>,
    store: Arc<dyn CompletionStore>,
}

impl MessageChannel {
    pub fn new(router: Arc<CommandRouter>, store: Arc<dyn CompletionStore>) -> Self {
        Self { router, store }
    }

    pub fn store(&self) -> Arc<dyn CompletionStore> {
        Arc::clone(&self.store)
    }

    /// Parses one JSON line and answers it; malformed input yields an `{error}` reply.
    pub async fn handle_line(&self, line: &str) -> InboundResponse {
        match serde_json::from_str::<InboundMessage>(line) {
            Ok(message) => self.handle_message(message).await,
            Err(err) => {
                warn!(target: "reelscout::messaging", error = %err, "malformed inbound message");
                InboundResponse::Error {
                    error: format!("Malformed message: {err}"),
                }
            }
        }
    }

    /// Wraps `message` in a fresh task and dispatches it.
    pub async fn handle_message(&self, message: InboundMessage) -> InboundResponse {
        let data = Value::Object(utils::filter_keys(&message.data, FORWARDED_KEYS));
        let request = TaskRequest::new(Uuid::new_v4().to_string(), message.command, data);
        self.dispatch(request).await
    }

    /// Routes `request` and persists the result as `lastCompletion` on success.
    pub async fn dispatch(&self, request: TaskRequest) -> InboundResponse {
        let task_id = request.task_id.clone();
        info!(target: "reelscout::messaging", %task_id, command = %request.command, "task received");
        match self.router.handle(request).await {
            Ok(data) => {
                self.remember(&task_id, &data).await;
                InboundResponse::Data { data }
            }
            Err(err) => {
                error!(target: "reelscout::messaging", %task_id, error = %err, "Error received");
                InboundResponse::Error {
                    error: err.to_string(),
                }
            }
        }
    }

    async fn remember(&self, task_id: &str, data: &ReelCollectionResult) {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "reelscout::messaging", task_id, error = %err, "could not encode completion");
                return;
            }
        };
        if let Err(err) = self.store.set(LAST_COMPLETION_KEY, value).await {
            warn!(target: "reelscout::messaging", task_id, error = %err, "could not persist completion");
        }
    }
}
