//! Core domain types and utilities for parley.
//!
//! This crate provides the foundational types and error handling shared by
//! the conversation, tool, AI, and chat crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, MessageId, ParseIdError};
