//! OpenAI-compatible chat completions gateway.

use crate::error::GatewayError;
use crate::gateway::{ChatMessage, ChatRole, Completion, ModelGateway, ToolCallRequest};
use async_trait::async_trait;
use parley_tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token, if the endpoint needs one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub name: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            name: default_model(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

/// Gateway speaking the OpenAI chat completions protocol.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: ChatRole,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a JsonValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

/// Builds the request body for a chat completion.
fn request_body<'a>(
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: &'a [ToolDefinition],
) -> WireRequest<'a> {
    WireRequest {
        model,
        messages: messages
            .iter()
            .map(|m| WireMessage {
                role: m.role,
                content: &m.content,
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|c| WireToolCall {
                        id: c.id.clone(),
                        kind: function_kind(),
                        function: WireFunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect(),
                tool_call_id: m.tool_call_id.as_deref(),
            })
            .collect(),
        tools: tools
            .iter()
            .map(|t| WireTool {
                kind: "function",
                function: WireFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect(),
    }
}

/// Maps a chat completion response body to a [`Completion`].
fn parse_completion(body: &str) -> Result<Completion, GatewayError> {
    let response: WireResponse =
        serde_json::from_str(body).map_err(|e| GatewayError::ResponseParseFailed {
            reason: e.to_string(),
        })?;

    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::ResponseParseFailed {
            reason: "response has no choices".to_string(),
        })?
        .message;

    match message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(Completion::ToolCalls(
            calls
                .into_iter()
                .map(|c| ToolCallRequest::new(c.id, c.function.name, c.function.arguments))
                .collect(),
        )),
        _ => Ok(Completion::Answer(message.content.unwrap_or_default())),
    }
}

impl OpenAiGateway {
    /// Creates a gateway using the given HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ModelGateway for OpenAiGateway {
    #[instrument(skip_all, fields(model = %self.config.name, messages = messages.len()))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> parley_core::Result<Completion, GatewayError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .timeout(Duration::from_secs(self.config.request_timeout_seconds))
            .json(&request_body(&self.config.name, messages, tools));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable {
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(GatewayError::RequestFailed {
                status: status.as_u16(),
                reason: body.chars().take(200).collect(),
            }
            .into());
        }

        let completion = parse_completion(&body)?;
        debug!(
            tool_calls = matches!(completion, Completion::ToolCalls(_)),
            "model completion received"
        );
        Ok(completion)
    }
}
