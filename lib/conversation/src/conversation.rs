//! Conversations and their persistence contract.
//!
//! A conversation is an append-only, ordered list of messages whose first
//! message is always from the user.

use crate::error::StoreError;
use crate::message::{Message, MessageRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_core::ConversationId;
use serde::{Deserialize, Serialize};

/// Title used until a generated one replaces it.
pub const DEFAULT_TITLE: &str = "Untitled conversation";

/// A conversation between a user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// Human-readable title.
    pub title: String,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation was last updated.
    pub updated_at: DateTime<Utc>,
    /// Messages in conversation order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Starts a new conversation with a single user message.
    #[must_use]
    pub fn start(content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            title: DEFAULT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
            messages: vec![Message::user(content)],
        }
    }

    /// Appends a message and bumps the update timestamp.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Returns the first user message, if any.
    #[must_use]
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role == MessageRole::User)
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Trait for conversation storage.
///
/// The chat flow calls this only at the start and end of an operation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Persists a brand new conversation.
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError>;

    /// Loads a conversation by ID.
    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError>;

    /// Replaces a stored conversation with the given state.
    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError>;
}
