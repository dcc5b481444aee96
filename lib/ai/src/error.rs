//! Error types for the AI crate.
//!
//! Errors are layered with rootcause:
//! - `GatewayError`: a single model round trip failed
//! - `AgentError`: reply generation failed; gateway failures are attached
//!   beneath `AgentError::ModelUnavailable` via `.context()`
//! - `TitleError`: title generation failed (never fatal to a caller)

use std::fmt;

/// Errors from a model gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The model endpoint could not be reached.
    Unavailable { reason: String },
    /// The endpoint answered with a non-success status.
    RequestFailed { status: u16, reason: String },
    /// The response body could not be decoded.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "model endpoint unavailable: {reason}"),
            Self::RequestFailed { status, reason } => {
                write!(f, "model request failed with status {status}: {reason}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Errors from the agent loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The model gateway failed.
    ModelUnavailable,
    /// The model's final answer was empty.
    EmptyReply,
    /// The model kept requesting tools past the round-trip bound.
    LoopBoundExceeded { max: u32 },
    /// The caller cancelled the turn.
    Cancelled,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelUnavailable => write!(f, "model unavailable"),
            Self::EmptyReply => write!(f, "model returned an empty reply"),
            Self::LoopBoundExceeded { max } => {
                write!(f, "no final answer after {max} model round trips")
            }
            Self::Cancelled => write!(f, "reply generation cancelled"),
        }
    }
}

impl std::error::Error for AgentError {}

/// Errors from title generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleError {
    /// The conversation has no user message to summarize.
    NoUserMessage,
    /// The model asked for tools instead of answering.
    UnexpectedToolCalls,
    /// The model answered with nothing usable.
    EmptyTitle,
    /// The model gateway failed.
    ModelUnavailable,
    /// The caller cancelled the request.
    Cancelled,
}

impl fmt::Display for TitleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUserMessage => write!(f, "conversation has no user message"),
            Self::UnexpectedToolCalls => write!(f, "model requested tools for a title"),
            Self::EmptyTitle => write!(f, "model returned an empty title"),
            Self::ModelUnavailable => write!(f, "model unavailable"),
            Self::Cancelled => write!(f, "title generation cancelled"),
        }
    }
}

impl std::error::Error for TitleError {}
