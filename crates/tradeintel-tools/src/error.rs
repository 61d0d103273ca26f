use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Failures surfaced to callers as structured error results.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Invalid argument '{field}': {reason}")]
    InvalidArguments { field: String, reason: String },

    #[error("Tool call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error while running tool")]
    Internal,
}

impl ToolError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidArguments {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::UnknownOperation(_) => "unknown_operation",
            ToolError::InvalidArguments { .. } => "invalid_arguments",
            ToolError::Timeout(_) => "timeout",
            ToolError::Internal => "internal",
        }
    }

    /// Machine-readable payload carried in an error `ToolCallResult`.
    pub fn to_content(&self) -> Value {
        let mut content = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        if let ToolError::InvalidArguments { field, .. } = self {
            content["field"] = json!(field);
        }
        content
    }
}

/// Failures inside an aggregation path.
#[derive(Error, Debug)]
pub enum AggregateError {
    /// Argument passed shape validation but is semantically unusable.
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Internal aggregation failure: {0}")]
    Internal(String),
}

impl AggregateError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AggregateError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<tradeintel_cache::CacheError> for AggregateError {
    fn from(e: tradeintel_cache::CacheError) -> Self {
        AggregateError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for AggregateError {
    fn from(e: serde_json::Error) -> Self {
        AggregateError::Internal(format!("JSON error: {e}"))
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),
}
