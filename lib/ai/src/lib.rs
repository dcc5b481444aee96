//! AI primitives for parley.
//!
//! This crate provides:
//!
//! - **Model Gateway**: one model round trip returning an answer or tool calls
//! - **Agent**: the bounded tool-calling loop that produces a reply
//! - **Title Generator**: a single-shot conversation label
//! - **Assistant**: the capability the chat flow depends on, combining both

pub mod agent;
pub mod assistant;
pub mod error;
pub mod gateway;
pub mod openai;
pub mod title;

pub use agent::{
    Agent, AgentConfig, AgentReply, DEFAULT_MAX_ROUND_TRIPS, DEFAULT_SYSTEM_PROMPT, ToolInvocation,
};
pub use assistant::{Assistant, ModelAssistant};
pub use error::{AgentError, GatewayError, TitleError};
pub use gateway::{ChatMessage, ChatRole, Completion, ModelGateway, ToolCallRequest};
pub use openai::{OpenAiConfig, OpenAiGateway};
pub use title::{MAX_TITLE_CHARS, TitleGenerator};
