//! The assistant capability used by the chat flow.

use crate::agent::{Agent, AgentConfig, AgentReply};
use crate::error::{AgentError, TitleError};
use crate::gateway::ModelGateway;
use crate::title::TitleGenerator;
use async_trait::async_trait;
use parley_conversation::Conversation;
use parley_tools::ToolRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Produces titles and replies for conversations.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Generates a short title from the conversation's opening message.
    ///
    /// # Errors
    ///
    /// Returns an error if no title could be produced.
    async fn title(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> parley_core::Result<String, TitleError>;

    /// Generates the assistant's next message.
    ///
    /// # Errors
    ///
    /// Returns an error if no reply could be produced.
    async fn reply(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> parley_core::Result<AgentReply, AgentError>;
}

/// [`Assistant`] backed by a model gateway and a tool registry.
#[derive(Clone)]
pub struct ModelAssistant {
    titles: TitleGenerator,
    agent: Agent,
}

impl ModelAssistant {
    /// Creates an assistant sharing one gateway between titles and replies.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            titles: TitleGenerator::new(gateway.clone()),
            agent: Agent::new(gateway, registry, config),
        }
    }
}

#[async_trait]
impl Assistant for ModelAssistant {
    async fn title(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> parley_core::Result<String, TitleError> {
        self.titles.generate(conversation, cancel).await
    }

    async fn reply(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> parley_core::Result<AgentReply, AgentError> {
        self.agent.reply(&conversation.messages, cancel).await
    }
}
