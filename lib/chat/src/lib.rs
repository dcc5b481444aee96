//! Conversation flow for parley.
//!
//! [`ChatService`] owns the two entry points: starting a conversation, which
//! generates a title and a reply in parallel, and continuing one, which
//! appends a user message and generates the next reply.

pub mod error;
pub mod service;

pub use error::ChatError;
pub use service::{ChatService, Turn};
