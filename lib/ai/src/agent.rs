//! Agent loop.
//!
//! The loop drives reply generation for one turn:
//! 1. Send the system prompt, history and tool schemas to the model
//! 2. If the model answers, stop
//! 3. Otherwise run every requested tool concurrently and feed the results back
//! 4. Repeat until an answer arrives or the round-trip bound is hit
//!
//! Tool failures never end the turn; they are fed back to the model as
//! normalized error text. Gateway failures and cancellation do.

use crate::error::AgentError;
use crate::gateway::{ChatMessage, Completion, ModelGateway, ToolCallRequest};
use futures::future::join_all;
use parley_conversation::Message;
use parley_tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default bound on model calls per turn.
pub const DEFAULT_MAX_ROUND_TRIPS: u32 = 6;

/// Default instructions for reply generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools \
whenever they can answer the question with live data, and reply concisely in the user's language.";

/// Configuration for the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls before giving up.
    #[serde(default = "default_max_round_trips")]
    pub max_round_trips: u32,
    /// System prompt sent ahead of the history.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_round_trips() -> u32 {
    DEFAULT_MAX_ROUND_TRIPS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_round_trips: DEFAULT_MAX_ROUND_TRIPS,
            system_prompt: default_system_prompt(),
        }
    }
}

impl AgentConfig {
    /// Sets the round-trip bound. The bound is at least one.
    #[must_use]
    pub fn with_max_round_trips(mut self, max: u32) -> Self {
        self.max_round_trips = max.max(1);
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

/// Record of a single tool call made during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Model-assigned call identifier.
    pub call_id: String,
    /// The tool that was invoked.
    pub tool_name: String,
    /// Output from the tool (if successful).
    pub output: Option<String>,
    /// Normalized error text (if failed).
    pub error: Option<String>,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

impl ToolInvocation {
    /// Creates a successful invocation record.
    #[must_use]
    pub fn success(call: &ToolCallRequest, output: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: Some(output.into()),
            error: None,
            latency_ms,
        }
    }

    /// Creates a failed invocation record.
    #[must_use]
    pub fn failure(call: &ToolCallRequest, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            output: None,
            error: Some(error.into()),
            latency_ms,
        }
    }

    /// Returns whether the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the text fed back to the model for this call.
    #[must_use]
    pub fn model_text(&self) -> &str {
        self.output
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }
}

/// The outcome of a successful turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    /// The final answer, trimmed and non-empty.
    pub text: String,
    /// Number of model calls made.
    pub round_trips: u32,
    /// Every tool call made, in request order.
    pub invocations: Vec<ToolInvocation>,
}

enum LoopState {
    Drafting,
    AwaitingToolResults(Vec<ToolCallRequest>),
    Done(String),
}

/// Runs the tool-calling loop against a model gateway.
#[derive(Clone)]
pub struct Agent {
    gateway: Arc<dyn ModelGateway>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Creates an agent.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        registry: Arc<ToolRegistry>,
        mut config: AgentConfig,
    ) -> Self {
        config.max_round_trips = config.max_round_trips.max(1);
        Self {
            gateway,
            registry,
            config,
        }
    }

    /// Generates the assistant's reply to the given history.
    ///
    /// # Errors
    ///
    /// - [`AgentError::ModelUnavailable`] if a gateway call fails
    /// - [`AgentError::LoopBoundExceeded`] if no answer arrives within the bound
    /// - [`AgentError::EmptyReply`] if the final answer is blank
    /// - [`AgentError::Cancelled`] if `cancel` fires while waiting
    #[instrument(skip_all, fields(history = history.len(), max_round_trips = self.config.max_round_trips))]
    pub async fn reply(
        &self,
        history: &[Message],
        cancel: &CancellationToken,
    ) -> parley_core::Result<AgentReply, AgentError> {
        let definitions = self.registry.definitions();
        let mut context: Vec<ChatMessage> = std::iter::once(ChatMessage::system(
            self.config.system_prompt.as_str(),
        ))
        .chain(history.iter().map(ChatMessage::from))
        .collect();
        let mut invocations = Vec::new();
        let mut round_trips = 0;
        let mut state = LoopState::Drafting;

        loop {
            state = match state {
                LoopState::Drafting => {
                    round_trips += 1;
                    let completion = tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(AgentError::Cancelled.into()),
                        result = self.gateway.complete(&context, &definitions) => result
                            .map_err(|report| report.context(AgentError::ModelUnavailable))?,
                    };

                    match completion {
                        Completion::Answer(text) => LoopState::Done(text),
                        Completion::ToolCalls(_) if round_trips >= self.config.max_round_trips => {
                            warn!(round_trips, "model still requesting tools at the bound");
                            return Err(AgentError::LoopBoundExceeded {
                                max: self.config.max_round_trips,
                            }
                            .into());
                        }
                        Completion::ToolCalls(calls) => LoopState::AwaitingToolResults(calls),
                    }
                }
                LoopState::AwaitingToolResults(calls) => {
                    debug!(round_trips, calls = calls.len(), "dispatching tool calls");
                    context.push(ChatMessage::tool_calls(calls.clone()));

                    let results = join_all(calls.iter().map(|call| self.invoke(call, cancel))).await;
                    if cancel.is_cancelled() {
                        return Err(AgentError::Cancelled.into());
                    }

                    for invocation in results {
                        context.push(ChatMessage::tool_result(
                            invocation.call_id.as_str(),
                            invocation.model_text(),
                        ));
                        invocations.push(invocation);
                    }
                    LoopState::Drafting
                }
                LoopState::Done(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(AgentError::EmptyReply.into());
                    }
                    info!(round_trips, tool_calls = invocations.len(), "reply generated");
                    return Ok(AgentReply {
                        text: text.to_string(),
                        round_trips,
                        invocations,
                    });
                }
            };
        }
    }

    async fn invoke(&self, call: &ToolCallRequest, cancel: &CancellationToken) -> ToolInvocation {
        let started = Instant::now();
        let result = self
            .registry
            .dispatch(&call.name, &call.arguments, cancel)
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(output) => ToolInvocation::success(call, output, latency_ms),
            Err(report) => {
                ToolInvocation::failure(call, report.current_context().model_message(), latency_ms)
            }
        }
    }
}
