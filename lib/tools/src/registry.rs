//! Tool registry.
//!
//! The registry is built once at startup from a fixed set of tools and is
//! read-only afterwards, so it can be shared behind an `Arc` without locks.
//! Every dispatch runs under the registry timeout and the caller's
//! cancellation token; whichever fires first abandons the handler.

use crate::error::ToolError;
use crate::tool::{Tool, ToolDefinition};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Default upper bound on a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry of available tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    /// Creates a registry over the given tools.
    ///
    /// Tools are keyed by their definition name; a later tool with the same
    /// name replaces an earlier one.
    #[must_use]
    pub fn new(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let tools = tools
            .into_iter()
            .map(|tool| (tool.definition().name, tool))
            .collect();
        Self {
            tools,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns every tool definition, sorted by name.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Runs a single named tool call and returns its text output.
    ///
    /// # Errors
    ///
    /// - [`ToolError::UnknownTool`] if no tool has this name
    /// - [`ToolError::Timeout`] if the handler exceeds the registry timeout
    /// - [`ToolError::Cancelled`] if `cancel` fires first
    /// - [`ToolError::ExecutionFailed`] if the handler reports a failure
    #[instrument(skip(self, arguments, cancel), fields(tool = %name))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &str,
        cancel: &CancellationToken,
    ) -> parley_core::Result<String, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("tool call cancelled by caller");
                return Err(ToolError::Cancelled {
                    name: name.to_string(),
                }
                .into());
            }
            outcome = tokio::time::timeout(self.timeout, tool.handle(arguments)) => outcome,
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "tool call timed out");
                Err(ToolError::Timeout {
                    name: name.to_string(),
                    timeout: self.timeout,
                }
                .into())
            }
            Ok(Err(e)) => {
                warn!(error = %e, details = e.details(), latency_ms, "tool call failed");
                Err(ToolError::ExecutionFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
            Ok(Ok(output)) => {
                debug!(latency_ms, output_len = output.len(), "tool call succeeded");
                Ok(output)
            }
        }
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.tools.keys().collect();
        names.sort();
        f.debug_struct("ToolRegistry")
            .field("tools", &names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::tool::parse_args;
    use async_trait::async_trait;
    use serde::Deserialize;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("echo", "Echo the text back").with_parameters(serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            }))
        }

        async fn handle(&self, arguments: &str) -> Result<String, HandlerError> {
            #[derive(Deserialize)]
            struct Args {
                text: String,
            }
            let args: Args = parse_args(arguments)?;
            Ok(args.text)
        }
    }

    struct HangingTool;

    #[async_trait]
    impl Tool for HangingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("hang", "Never returns")
        }

        async fn handle(&self, _arguments: &str) -> Result<String, HandlerError> {
            std::future::pending::<()>().await;
            Ok(String::new())
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("broken", "Always fails")
        }

        async fn handle(&self, _arguments: &str) -> Result<String, HandlerError> {
            Err(HandlerError::unavailable(
                "inventory",
                "connection refused (os error 111) at 10.0.0.7:5432",
            ))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new([
            Arc::new(EchoTool) as Arc<dyn Tool>,
            Arc::new(HangingTool) as Arc<dyn Tool>,
            Arc::new(BrokenTool) as Arc<dyn Tool>,
        ])
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let names: Vec<_> = registry()
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["broken", "echo", "hang"]);
    }

    #[test]
    fn default_timeout_is_five_seconds() {
        assert_eq!(registry().timeout(), Duration::from_secs(5));
        assert_eq!(
            registry().with_timeout(Duration::from_millis(50)).timeout(),
            Duration::from_millis(50)
        );
    }

    #[tokio::test]
    async fn dispatch_runs_the_named_tool() {
        let out = registry()
            .dispatch("echo", r#"{"text":"hola"}"#, &CancellationToken::new())
            .await
            .expect("dispatch");
        assert_eq!(out, "hola");
    }

    #[tokio::test]
    async fn unknown_tool_fails_for_any_payload() {
        let registry = registry();
        for payload in ["", "{}", r#"{"text":"x"}"#, "not json"] {
            let err = registry
                .dispatch("missing", payload, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(
                err.current_context(),
                &ToolError::UnknownTool {
                    name: "missing".to_string()
                }
            );
        }
    }

    #[tokio::test]
    async fn invalid_arguments_are_an_execution_failure() {
        let err = registry()
            .dispatch("echo", r#"{"txt":1}"#, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.current_context(),
            &ToolError::ExecutionFailed {
                name: "echo".to_string(),
                reason: "invalid arguments".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn handler_failure_is_normalized() {
        let err = registry()
            .dispatch("broken", "{}", &CancellationToken::new())
            .await
            .unwrap_err();
        let message = err.current_context().model_message();
        assert_eq!(
            message,
            "error: tool 'broken' failed: inventory service unavailable"
        );
        assert!(!message.contains("10.0.0.7"));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_handler_times_out_at_the_bound() {
        let registry = registry();
        let started = tokio::time::Instant::now();
        let err = registry
            .dispatch("hang", "{}", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.current_context(), ToolError::Timeout { .. }));
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_TOOL_TIMEOUT);
        assert!(elapsed < DEFAULT_TOOL_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_stops_the_call() {
        let registry = registry();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = registry.dispatch("hang", "{}", &cancel).await.unwrap_err();

        assert!(matches!(err.current_context(), ToolError::Cancelled { .. }));
        assert!(started.elapsed() < DEFAULT_TOOL_TIMEOUT);
    }
}
