//! Database repositories for parley.
//!
//! This module provides Postgres-backed storage for conversations and their
//! messages.

pub mod conversation;

pub use conversation::PgConversationStore;
