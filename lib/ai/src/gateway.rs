//! Model gateway abstraction.
//!
//! A gateway takes the working message history plus the tool schemas and
//! returns either a final answer or a batch of tool-call requests.

use crate::error::GatewayError;
use async_trait::async_trait;
use parley_conversation::{Message, MessageRole};
use parley_tools::ToolDefinition;
use serde::{Deserialize, Serialize};

/// The role of a message in the model's working context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model.
    System,
    /// User message.
    User,
    /// Model message.
    Assistant,
    /// Result of a tool call.
    Tool,
}

impl From<MessageRole> for ChatRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
            MessageRole::Tool => Self::Tool,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Model-assigned call identifier, echoed back with the result.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// Raw JSON argument payload.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Creates a tool call request.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A message in the model's working context.
///
/// Unlike a persisted [`Message`], this can carry the tool-call bookkeeping
/// of an in-flight agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message.
    pub role: ChatRole,
    /// Text content.
    pub content: String,
    /// Tool calls requested by an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// The call a tool result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Creates the assistant turn that requested the given tool calls.
    #[must_use]
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(ChatRole::Assistant, "")
        }
    }

    /// Creates a tool result answering `call_id`.
    #[must_use]
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(ChatRole::Tool, content)
        }
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role.into(), message.content.clone())
    }
}

/// What the model decided to do with a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A final textual answer.
    Answer(String),
    /// One or more tool invocations to run before answering.
    ToolCalls(Vec<ToolCallRequest>),
}

/// Trait for model gateways.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sends the working context and tool schemas to the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model could not produce a completion.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> parley_core::Result<Completion, GatewayError>;
}
