//! Postgres conversation store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parley_conversation::{Conversation, ConversationStore, Message, MessageRole, StoreError};
use parley_core::{ConversationId, MessageId};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use tracing::instrument;

/// Row type for conversation queries.
#[derive(FromRow)]
struct ConversationRow {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row type for message queries.
#[derive(FromRow)]
struct MessageRow {
    id: String,
    role: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(what: &str, value: &str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::StorageFailed {
        reason: format!("invalid {what} '{value}': {reason}"),
    }
}

fn storage_failed(e: sqlx::Error) -> StoreError {
    StoreError::StorageFailed {
        reason: e.to_string(),
    }
}

impl MessageRow {
    fn try_into_message(self) -> Result<Message, StoreError> {
        let id = MessageId::from_str(&self.id).map_err(|e| corrupt("message id", &self.id, e))?;
        let role = MessageRole::from_str(&self.role)
            .map_err(|e| corrupt("message role", &self.role, e))?;

        Ok(Message {
            id,
            role,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ConversationRow {
    fn try_into_conversation(self, messages: Vec<MessageRow>) -> Result<Conversation, StoreError> {
        let id = ConversationId::from_str(&self.id)
            .map_err(|e| corrupt("conversation id", &self.id, e))?;
        let messages = messages
            .into_iter()
            .map(MessageRow::try_into_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Conversation {
            id,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
            messages,
        })
    }
}

/// Conversation store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    /// Creates a new store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts messages not yet stored; stored messages are never rewritten.
    async fn insert_messages(
        tx: &mut Transaction<'_, Postgres>,
        conversation: &Conversation,
    ) -> Result<(), sqlx::Error> {
        for (position, message) in conversation.messages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO conversation_messages
                    (id, conversation_id, position, role, content, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(message.id.to_string())
            .bind(conversation.id.to_string())
            .bind(position as i32)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(message.created_at)
            .bind(message.updated_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    #[instrument(skip_all, fields(conversation_id = %conversation.id))]
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_failed)?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::AlreadyExists {
                id: conversation.id,
            },
            other => storage_failed(other),
        })?;

        Self::insert_messages(&mut tx, conversation)
            .await
            .map_err(storage_failed)?;
        tx.commit().await.map_err(storage_failed)
    }

    #[instrument(skip(self))]
    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_failed)?;

        let row = row.ok_or(StoreError::NotFound { id })?;

        let messages: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, role, content, created_at, updated_at
            FROM conversation_messages
            WHERE conversation_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_failed)?;

        row.try_into_conversation(messages)
    }

    #[instrument(skip_all, fields(conversation_id = %conversation.id))]
    async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(storage_failed)?;

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET title = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(&conversation.title)
        .bind(conversation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_failed)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                id: conversation.id,
            });
        }

        Self::insert_messages(&mut tx, conversation)
            .await
            .map_err(storage_failed)?;
        tx.commit().await.map_err(storage_failed)
    }
}
