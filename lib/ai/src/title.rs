//! Conversation titles.

use crate::error::TitleError;
use crate::gateway::{ChatMessage, Completion, ModelGateway};
use parley_conversation::Conversation;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Longest title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 80;

const TITLE_PROMPT: &str = "Write a short title (at most six words) for a conversation that \
starts with the following message. Reply with the title only, no quotes or punctuation at the end.";

/// Condenses a conversation's opening message into a short label.
#[derive(Clone)]
pub struct TitleGenerator {
    gateway: Arc<dyn ModelGateway>,
}

impl TitleGenerator {
    /// Creates a title generator.
    #[must_use]
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Generates a title from the conversation's first user message.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails, asks for tools, or returns
    /// nothing usable. Callers are expected to fall back to a default.
    #[instrument(skip_all, fields(conversation_id = %conversation.id))]
    pub async fn generate(
        &self,
        conversation: &Conversation,
        cancel: &CancellationToken,
    ) -> parley_core::Result<String, TitleError> {
        let first = conversation
            .first_user_message()
            .ok_or(TitleError::NoUserMessage)?;
        let messages = [
            ChatMessage::system(TITLE_PROMPT),
            ChatMessage::user(first.content.as_str()),
        ];

        let completion = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TitleError::Cancelled.into()),
            result = self.gateway.complete(&messages, &[]) => result
                .map_err(|report| report.context(TitleError::ModelUnavailable))?,
        };

        match completion {
            Completion::ToolCalls(_) => Err(TitleError::UnexpectedToolCalls.into()),
            Completion::Answer(text) => {
                let title = normalize_title(&text).ok_or(TitleError::EmptyTitle)?;
                debug!(%title, "title generated");
                Ok(title)
            }
        }
    }
}

/// Keeps the first non-blank line, strips quotes, and caps the length.
fn normalize_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let title = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '`'))
        .trim();
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string())
}
