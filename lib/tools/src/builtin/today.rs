//! Current date tool.

use crate::error::HandlerError;
use crate::tool::{Tool, ToolDefinition};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

/// Returns the current date and time in RFC 3339 format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TodayTool;

#[async_trait]
impl Tool for TodayTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_today_date",
            "Get today's date and time in RFC3339 format",
        )
    }

    async fn handle(&self, _arguments: &str) -> Result<String, HandlerError> {
        Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
