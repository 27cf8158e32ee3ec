//! Task-level errors surfaced by the router and the orchestrator.

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Message returned when the opened tab is not a reels listing.
pub const INVALID_REELS_URL: &str =
    "Invalid Instagram url provided; the url must end with '/reels'";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Invalid parameters: {} in command: {request}", .keys.join(","))]
    InvalidParameters { keys: Vec<String>, request: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidPageState(String),

    #[error("{0}")]
    ScriptExecutionFailed(String),

    #[error("tab operation failed: {0}")]
    TabOperationFailed(String),
}

impl TaskError {
    pub fn invalid_page() -> Self {
        TaskError::InvalidPageState(INVALID_REELS_URL.to_string())
    }

    /// Stable identifier for structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            TaskError::InvalidParameters { .. } => "invalid_parameters",
            TaskError::UnknownCommand(_) => "unknown_command",
            TaskError::InvalidPageState(_) => "invalid_page_state",
            TaskError::ScriptExecutionFailed(_) => "script_execution_failed",
            TaskError::TabOperationFailed(_) => "tab_operation_failed",
        }
    }
}

impl From<AdapterError> for TaskError {
    fn from(err: AdapterError) -> Self {
        if err.is_script_failure() {
            TaskError::ScriptExecutionFailed(err.to_string())
        } else {
            TaskError::TabOperationFailed(err.to_string())
        }
    }
}
