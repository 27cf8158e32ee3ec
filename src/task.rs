//! Command envelopes, task outcome records and the task logger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::TaskError;
use crate::utils;

/// Commands the router knows how to dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "crawl-ig-page")]
    CrawlIgPage,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::CrawlIgPage => "crawl-ig-page",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = TaskError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "crawl-ig-page" => Ok(CommandName::CrawlIgPage),
            other => Err(TaskError::UnknownCommand(other.to_string())),
        }
    }
}

/// A unit of work handed to the router.
///
/// `command` stays a raw string so unrecognised names can be reported as such.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "taskId", default)]
    pub task_id: String,
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

impl TaskRequest {
    pub fn new(task_id: impl Into<String>, command: impl Into<String>, data: Value) -> Self {
        Self {
            task_id: task_id.into(),
            command: command.into(),
            data,
        }
    }

    pub fn crawl(task_id: impl Into<String>, url: impl Into<String>, reel_qty: u64) -> Self {
        Self::new(
            task_id,
            CommandName::CrawlIgPage.as_str(),
            json!({ "url": url.into(), "reel_qty": reel_qty }),
        )
    }

    /// Compact JSON rendering used in error messages and logs.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Validated arguments of a `crawl-ig-page` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrawlParams {
    pub url: String,
    pub reel_qty: usize,
}

impl CrawlParams {
    pub const URL_KEY: &'static str = "data.url";
    pub const REEL_QTY_KEY: &'static str = "data.reel_qty";

    pub fn from_request(req: &TaskRequest) -> Result<Self, TaskError> {
        let url = req
            .data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| utils::is_http_website(url));
        let reel_qty = req
            .data
            .get("reel_qty")
            .and_then(Value::as_u64)
            .filter(|qty| *qty >= 1)
            .and_then(|qty| usize::try_from(qty).ok());

        match (url, reel_qty) {
            (Some(url), Some(reel_qty)) => Ok(Self {
                url: url.to_string(),
                reel_qty,
            }),
            (url, reel_qty) => {
                let mut keys = Vec::new();
                if url.is_none() {
                    keys.push(Self::URL_KEY.to_string());
                }
                if reel_qty.is_none() {
                    keys.push(Self::REEL_QTY_KEY.to_string());
                }
                Err(TaskError::InvalidParameters {
                    keys,
                    request: req.to_json_string(),
                })
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Error,
}

/// Uniform outcome record; exactly one of `data` and `error` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskResultRecord")]
pub struct TaskResult {
    status: TaskStatus,
    data: Option<Value>,
    error: Option<String>,
    #[serde(rename = "taskId")]
    task_id: String,
    command: String,
}

impl TaskResult {
    pub fn completed(data: Value, task_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Completed,
            data: Some(data),
            error: None,
            task_id: task_id.into(),
            command: command.into(),
        }
    }

    pub fn failed(
        error: impl Into<String>,
        task_id: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            status: TaskStatus::Error,
            data: None,
            error: Some(error.into()),
            task_id: task_id.into(),
            command: command.into(),
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[derive(Deserialize)]
struct TaskResultRecord {
    status: TaskStatus,
    data: Option<Value>,
    error: Option<String>,
    #[serde(rename = "taskId")]
    task_id: String,
    command: String,
}

impl TryFrom<TaskResultRecord> for TaskResult {
    type Error = String;

    fn try_from(record: TaskResultRecord) -> Result<Self, Self::Error> {
        match (record.status, record.data, record.error) {
            (TaskStatus::Completed, Some(data), None) => {
                Ok(Self::completed(data, record.task_id, record.command))
            }
            (TaskStatus::Error, None, Some(error)) => {
                Ok(Self::failed(error, record.task_id, record.command))
            }
            (status, _, _) => Err(format!(
                "{status:?} task result must carry exactly one of data and error"
            )),
        }
    }
}

/// Emits one JSON line per finished task.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskLogger;

impl TaskLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log_success<T: Serialize>(&self, data: &T, task_id: &str, command: &str) -> TaskResult {
        let data = serde_json::to_value(data)
            .unwrap_or_else(|err| json!({ "unserializable": err.to_string() }));
        let result = TaskResult::completed(data, task_id, command);
        self.log_task(&result);
        result
    }

    pub fn log_failure(&self, err: &TaskError, task_id: &str, command: &str) -> TaskResult {
        let result = TaskResult::failed(err.to_string(), task_id, command);
        self.log_task(&result);
        result
    }

    pub fn log_task(&self, result: &TaskResult) {
        let line = serde_json::to_string(result).unwrap_or_else(|_| format!("{result:?}"));
        match result.status {
            TaskStatus::Completed => info!(
                target: "reelscout::task",
                task_id = %result.task_id,
                command = %result.command,
                "{line}"
            ),
            TaskStatus::Error => error!(
                target: "reelscout::task",
                task_id = %result.task_id,
                command = %result.command,
                "{line}"
            ),
        }
    }
}
