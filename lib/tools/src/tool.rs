//! Tool capability.
//!
//! A tool is a named operation the model may request mid-turn, e.g. a
//! weather lookup or a stock quote. Each tool declares a JSON schema for its
//! arguments and decodes the raw argument payload itself.

use crate::error::HandlerError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Definition of a tool as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for input parameters.
    pub parameters: JsonValue,
}

impl ToolDefinition {
    /// Creates a new tool definition that takes no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Sets the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: JsonValue) -> Self {
        self.parameters = schema;
        self
    }

    /// Returns the names of required parameters.
    #[must_use]
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|names| names.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default()
    }
}

/// Trait for tool execution.
///
/// Handlers must tolerate being dropped at any await point: a timed out or
/// cancelled call is abandoned, never awaited to completion.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the raw JSON argument payload from the model.
    async fn handle(&self, arguments: &str) -> Result<String, HandlerError>;
}

/// Decodes a raw argument payload into the tool's own argument shape.
///
/// An empty payload is treated as an empty object.
///
/// # Errors
///
/// Returns [`HandlerError::InvalidArguments`] if the payload does not match.
pub fn parse_args<T: DeserializeOwned>(raw: &str) -> Result<T, HandlerError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| HandlerError::invalid_arguments("invalid arguments", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct LocationArgs {
        location: String,
    }

    #[derive(Debug, Default, Deserialize)]
    struct OptionalArgs {
        #[serde(default)]
        max_count: Option<i64>,
    }

    #[test]
    fn tool_definition_builder() {
        let tool = ToolDefinition::new("get_weather", "Look up the weather").with_parameters(
            serde_json::json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string" }
                },
                "required": ["location"]
            }),
        );

        assert_eq!(tool.name, "get_weather");
        assert_eq!(tool.required_parameters(), vec!["location"]);
    }

    #[test]
    fn default_definition_has_no_required_parameters() {
        let tool = ToolDefinition::new("get_today_date", "Today");
        assert!(tool.required_parameters().is_empty());
        assert_eq!(tool.parameters["type"], "object");
    }

    #[test]
    fn parse_args_decodes_payload() {
        let args: LocationArgs = parse_args(r#"{"location":"Barcelona"}"#).expect("parse");
        assert_eq!(args.location, "Barcelona");
    }

    #[test]
    fn parse_args_treats_empty_payload_as_object() {
        let args: OptionalArgs = parse_args("  ").expect("parse");
        assert_eq!(args.max_count, None);
    }

    #[test]
    fn parse_args_reports_invalid_arguments() {
        let err = parse_args::<LocationArgs>(r#"{"city":"Barcelona"}"#).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArguments { .. }));
        assert_eq!(err.to_string(), "invalid arguments");
        assert!(err.details().contains("location"));
    }
}
