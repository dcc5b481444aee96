//! In-memory conversation store.

use crate::conversation::{Conversation, ConversationStore};
use crate::error::StoreError;
use async_trait::async_trait;
use parley_core::ConversationId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Conversation store backed by a map, for tests and database-less runs.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(&conversation.id) {
            return Err(StoreError::AlreadyExists {
                id: conversation.id,
            });
        }
        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        self.conversations
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }

    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(&conversation.id) {
            Some(stored) => {
                *stored = conversation.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                id: conversation.id,
            }),
        }
    }
}
