//! Error types for the tools crate.
//!
//! - `HandlerError`: what a tool handler reports about its own failure
//! - `ToolError`: registry-level dispatch failures, wrapped in a rootcause
//!   `Report` by [`ToolRegistry::dispatch`](crate::ToolRegistry::dispatch)

use std::fmt;
use std::time::Duration;

/// Failure reported by a tool handler.
///
/// The `Display` form is short and safe to show to the model. Anything
/// implementation specific goes in `details`, which is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The argument payload did not match the tool's shape.
    InvalidArguments { reason: String, details: String },
    /// A backing service could not be reached or answered badly.
    Unavailable { service: String, details: String },
    /// Any other handler failure.
    Failed { reason: String, details: String },
}

impl HandlerError {
    /// Creates an `InvalidArguments` error with a model-facing reason.
    #[must_use]
    pub fn invalid_arguments(reason: impl Into<String>, details: impl fmt::Display) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
            details: details.to_string(),
        }
    }

    /// Creates an `Unavailable` error for the named service.
    #[must_use]
    pub fn unavailable(service: impl Into<String>, details: impl fmt::Display) -> Self {
        Self::Unavailable {
            service: service.into(),
            details: details.to_string(),
        }
    }

    /// Returns implementation details suitable for logs only.
    #[must_use]
    pub fn details(&self) -> &str {
        match self {
            Self::InvalidArguments { details, .. }
            | Self::Unavailable { details, .. }
            | Self::Failed { details, .. } => details,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments { reason, .. } | Self::Failed { reason, .. } => {
                write!(f, "{reason}")
            }
            Self::Unavailable { service, .. } => write!(f, "{service} service unavailable"),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Errors from dispatching a tool call through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool is registered under this name.
    UnknownTool { name: String },
    /// The handler did not finish within the registry timeout.
    Timeout { name: String, timeout: Duration },
    /// The handler reported a failure.
    ExecutionFailed { name: String, reason: String },
    /// The caller cancelled the call.
    Cancelled { name: String },
}

impl ToolError {
    /// Renders the failure as the text fed back to the model.
    #[must_use]
    pub fn model_message(&self) -> String {
        match self {
            Self::UnknownTool { name } => format!("error: unknown tool '{name}'"),
            Self::Timeout { name, .. } => format!("error: tool '{name}' timed out"),
            Self::ExecutionFailed { name, reason } => {
                format!("error: tool '{name}' failed: {reason}")
            }
            Self::Cancelled { name } => format!("error: tool '{name}' was cancelled"),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool { name } => write!(f, "unknown tool: {name}"),
            Self::Timeout { name, timeout } => {
                write!(f, "tool '{name}' timed out after {}ms", timeout.as_millis())
            }
            Self::ExecutionFailed { name, reason } => {
                write!(f, "tool '{name}' execution failed: {reason}")
            }
            Self::Cancelled { name } => write!(f, "tool '{name}' cancelled"),
        }
    }
}

impl std::error::Error for ToolError {}
