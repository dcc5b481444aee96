//! Chat HTTP handlers.
//!
//! Each request gets its own cancellation token, cancelled on drop, so a
//! client that disconnects stops any model or tool work still in flight.

use crate::app::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Path of the start conversation endpoint.
pub const START_CONVERSATION_PATH: &str = "/twirp/parley.chat.ChatService/StartConversation";

/// Path of the continue conversation endpoint.
pub const CONTINUE_CONVERSATION_PATH: &str =
    "/twirp/parley.chat.ChatService/ContinueConversation";

/// Request body for starting a conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartConversationRequest {
    /// The user's first message.
    #[serde(default)]
    pub message: String,
}

/// Response body for a started conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartConversationResponse {
    /// Identifier of the new conversation.
    pub conversation_id: String,
    /// Generated title, or the default one.
    pub title: String,
    /// The assistant's reply.
    pub reply: String,
}

/// Request body for continuing a conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContinueConversationRequest {
    /// Identifier of an existing conversation.
    #[serde(default)]
    pub conversation_id: String,
    /// The user's next message.
    #[serde(default)]
    pub message: String,
}

/// Response body for a continued conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContinueConversationResponse {
    /// The assistant's reply.
    pub reply: String,
}

/// Liveness greeting.
pub async fn greeting() -> &'static str {
    "Hi, this is parley!"
}

/// Starts a conversation.
pub async fn start_conversation(
    State(state): State<AppState>,
    Json(request): Json<StartConversationRequest>,
) -> Result<Json<StartConversationResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let turn = state
        .chat
        .start_conversation(&request.message, &cancel)
        .await?;

    Ok(Json(StartConversationResponse {
        conversation_id: turn.conversation.id.to_string(),
        title: turn.conversation.title,
        reply: turn.reply.text,
    }))
}

/// Continues a conversation.
pub async fn continue_conversation(
    State(state): State<AppState>,
    Json(request): Json<ContinueConversationRequest>,
) -> Result<Json<ContinueConversationResponse>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let turn = state
        .chat
        .continue_conversation(&request.conversation_id, &request.message, &cancel)
        .await?;

    Ok(Json(ContinueConversationResponse {
        reply: turn.reply.text,
    }))
}
