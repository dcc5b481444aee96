//! Error types for the chat flow.

use parley_ai::AgentError;
use parley_conversation::StoreError;
use std::fmt;

/// Errors surfaced by [`ChatService`](crate::ChatService) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// A required input was empty or malformed.
    InvalidArgument { field: &'static str },
    /// No conversation has this identifier.
    NotFound { id: String },
    /// The model could not be reached.
    ModelUnavailable,
    /// The model's final answer was empty.
    EmptyReply,
    /// The model never settled on an answer.
    LoopBoundExceeded { max: u32 },
    /// The caller went away.
    Cancelled,
    /// The conversation store failed.
    Storage,
    /// A background task failed unexpectedly.
    Internal,
}

impl ChatError {
    /// Returns a stable machine-readable code for the error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::ModelUnavailable => "model_unavailable",
            Self::EmptyReply => "empty_reply",
            Self::LoopBoundExceeded { .. } => "loop_bound_exceeded",
            Self::Cancelled => "cancelled",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl From<&AgentError> for ChatError {
    fn from(err: &AgentError) -> Self {
        match err {
            AgentError::ModelUnavailable => Self::ModelUnavailable,
            AgentError::EmptyReply => Self::EmptyReply,
            AgentError::LoopBoundExceeded { max } => Self::LoopBoundExceeded { max: *max },
            AgentError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<&StoreError> for ChatError {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id: id.to_string() },
            StoreError::AlreadyExists { .. } | StoreError::StorageFailed { .. } => Self::Storage,
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { field } => write!(f, "{field} is required"),
            Self::NotFound { id } => write!(f, "conversation not found: {id}"),
            Self::ModelUnavailable => write!(f, "model unavailable"),
            Self::EmptyReply => write!(f, "model returned an empty reply"),
            Self::LoopBoundExceeded { max } => {
                write!(f, "no answer after {max} model round trips")
            }
            Self::Cancelled => write!(f, "request cancelled"),
            Self::Storage => write!(f, "conversation storage failed"),
            Self::Internal => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ChatError {}
