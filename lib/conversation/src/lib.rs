//! Conversation model for parley.
//!
//! This crate provides:
//!
//! - **Messages**: user, assistant, and tool utterances
//! - **Conversations**: append-only message history with a title
//! - **Conversation Store**: persistence contract plus an in-memory store

pub mod conversation;
pub mod error;
pub mod message;
pub mod store;

pub use conversation::{Conversation, ConversationStore, DEFAULT_TITLE};
pub use error::StoreError;
pub use message::{Message, MessageRole};
pub use store::InMemoryConversationStore;
