//! HTTP error mapping and startup errors.
//!
//! Chat failures are rendered as `{code, msg}` bodies. Only the error kind
//! reaches the client; the attached causes are logged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parley_chat::ChatError;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub code: String,
    /// Short human-readable message.
    pub msg: String,
}

/// A chat failure on its way to the client.
#[derive(Debug)]
pub struct ApiError(Report<ChatError>);

impl From<Report<ChatError>> for ApiError {
    fn from(report: Report<ChatError>) -> Self {
        Self(report)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0.current_context() {
            ChatError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            ChatError::NotFound { .. } => StatusCode::NOT_FOUND,
            ChatError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            ChatError::ModelUnavailable
            | ChatError::EmptyReply
            | ChatError::LoopBoundExceeded { .. } => StatusCode::BAD_GATEWAY,
            ChatError::Storage | ChatError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.current_context();

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %kind, "request rejected");
        }

        let body = ErrorBody {
            code: kind.code().to_string(),
            msg: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Configuration { details: String },
    /// The database could not be reached or migrated.
    Database { details: String },
    /// The HTTP client could not be built.
    HttpClient { details: String },
    /// The listener could not be bound or the server failed.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "invalid configuration: {details}"),
            Self::Database { details } => write!(f, "database error: {details}"),
            Self::HttpClient { details } => write!(f, "failed to build HTTP client: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
