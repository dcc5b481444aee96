//! Conversation flow controller.
//!
//! Start runs title and reply generation concurrently against one immutable
//! snapshot of the new conversation. The two halves fail asymmetrically: a
//! title failure is logged and the default title kept, while a reply failure
//! cancels the title task and fails the whole operation. Nothing is persisted
//! unless the reply succeeds.
//!
//! Continue is sequential: load, append, reply, update.

use crate::error::ChatError;
use parley_ai::{AgentError, AgentReply, Assistant};
use parley_conversation::{Conversation, ConversationStore, Message, StoreError};
use parley_core::ConversationId;
use rootcause::Report;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// The result of a successful start or continue.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The conversation as persisted.
    pub conversation: Conversation,
    /// The reply that was appended.
    pub reply: AgentReply,
}

/// Orchestrates conversations over a store and an assistant.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    assistant: Arc<dyn Assistant>,
}

fn reply_failure(report: Report<AgentError>) -> Report<ChatError> {
    let kind = ChatError::from(report.current_context());
    report.context(kind)
}

fn store_failure(err: StoreError) -> Report<ChatError> {
    let kind = ChatError::from(&err);
    Report::<StoreError>::from(err).context(kind)
}

impl ChatService {
    /// Creates a chat service.
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStore>, assistant: Arc<dyn Assistant>) -> Self {
        Self { store, assistant }
    }

    /// Starts a new conversation from the user's first message.
    ///
    /// # Errors
    ///
    /// - [`ChatError::InvalidArgument`] if `message` is blank
    /// - the reply failure kind if no reply could be generated
    /// - [`ChatError::Storage`] if the conversation could not be saved
    #[instrument(skip_all)]
    pub async fn start_conversation(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> parley_core::Result<Turn, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::InvalidArgument { field: "message" }.into());
        }

        let snapshot = Arc::new(Conversation::start(message));
        let group = cancel.child_token();

        let title_task = tokio::spawn({
            let assistant = Arc::clone(&self.assistant);
            let conversation = Arc::clone(&snapshot);
            let group = group.clone();
            async move { assistant.title(&conversation, &group).await }
        });

        let reply_task = tokio::spawn({
            let assistant = Arc::clone(&self.assistant);
            let conversation = Arc::clone(&snapshot);
            let group = group.clone();
            async move {
                let reply = assistant.reply(&conversation, &group).await;
                if reply.is_err() {
                    group.cancel();
                }
                reply
            }
        });

        let (title, reply) = tokio::join!(title_task, reply_task);

        let reply = match reply {
            Ok(reply) => reply.map_err(reply_failure)?,
            Err(join_error) => {
                error!(error = %join_error, "reply task failed");
                group.cancel();
                return Err(ChatError::Internal.into());
            }
        };

        let mut conversation =
            Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone());

        match title {
            Ok(Ok(title)) => conversation.title = title,
            Ok(Err(report)) => {
                warn!(error = %report, "title generation failed, keeping default title");
            }
            Err(join_error) => {
                warn!(error = %join_error, "title task failed, keeping default title");
            }
        }

        conversation.push(Message::assistant(reply.text.as_str()));
        self.store
            .create(&conversation)
            .await
            .map_err(store_failure)?;

        info!(
            conversation_id = %conversation.id,
            round_trips = reply.round_trips,
            "conversation started"
        );
        Ok(Turn {
            conversation,
            reply,
        })
    }

    /// Appends a user message to an existing conversation and replies.
    ///
    /// # Errors
    ///
    /// - [`ChatError::InvalidArgument`] if either input is blank or the id is malformed
    /// - [`ChatError::NotFound`] if the conversation does not exist
    /// - the reply failure kind if no reply could be generated
    /// - [`ChatError::Storage`] if the store fails
    #[instrument(skip(self, message, cancel))]
    pub async fn continue_conversation(
        &self,
        conversation_id: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> parley_core::Result<Turn, ChatError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(ChatError::InvalidArgument {
                field: "conversation_id",
            }
            .into());
        }
        let id: ConversationId = conversation_id.parse().map_err(|e| {
            debug!(error = %e, "malformed conversation id");
            ChatError::InvalidArgument {
                field: "conversation_id",
            }
        })?;
        if message.trim().is_empty() {
            return Err(ChatError::InvalidArgument { field: "message" }.into());
        }

        let mut conversation = self.store.load(id).await.map_err(store_failure)?;
        conversation.push(Message::user(message));

        let reply = self
            .assistant
            .reply(&conversation, cancel)
            .await
            .map_err(reply_failure)?;

        conversation.push(Message::assistant(reply.text.as_str()));
        self.store
            .update(&conversation)
            .await
            .map_err(store_failure)?;

        info!(
            messages = conversation.message_count(),
            round_trips = reply.round_trips,
            "conversation continued"
        );
        Ok(Turn {
            conversation,
            reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parley_ai::TitleError;
    use parley_conversation::{DEFAULT_TITLE, InMemoryConversationStore, MessageRole};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    enum TitleBehavior {
        Fixed(&'static str),
        Fail,
        /// Waits for cancellation, then reports it.
        UntilCancelled,
    }

    #[derive(Clone)]
    enum ReplyBehavior {
        Fixed(&'static str),
        Fail(AgentError),
    }

    struct StubAssistant {
        title: TitleBehavior,
        reply: ReplyBehavior,
        title_calls: AtomicUsize,
        reply_calls: AtomicUsize,
        title_saw_messages: Mutex<Option<usize>>,
        title_was_cancelled: Mutex<bool>,
    }

    impl StubAssistant {
        fn new(title: TitleBehavior, reply: ReplyBehavior) -> Arc<Self> {
            Arc::new(Self {
                title,
                reply,
                title_calls: AtomicUsize::new(0),
                reply_calls: AtomicUsize::new(0),
                title_saw_messages: Mutex::new(None),
                title_was_cancelled: Mutex::new(false),
            })
        }

        fn model_calls(&self) -> usize {
            self.title_calls.load(Ordering::SeqCst) + self.reply_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Assistant for StubAssistant {
        async fn title(
            &self,
            conversation: &Conversation,
            cancel: &CancellationToken,
        ) -> parley_core::Result<String, TitleError> {
            self.title_calls.fetch_add(1, Ordering::SeqCst);
            *self.title_saw_messages.lock().unwrap() = Some(conversation.message_count());
            match &self.title {
                TitleBehavior::Fixed(title) => Ok((*title).to_string()),
                TitleBehavior::Fail => Err(TitleError::ModelUnavailable.into()),
                TitleBehavior::UntilCancelled => {
                    cancel.cancelled().await;
                    *self.title_was_cancelled.lock().unwrap() = true;
                    Err(TitleError::Cancelled.into())
                }
            }
        }

        async fn reply(
            &self,
            _conversation: &Conversation,
            _cancel: &CancellationToken,
        ) -> parley_core::Result<AgentReply, AgentError> {
            self.reply_calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                ReplyBehavior::Fixed(text) => Ok(AgentReply {
                    text: (*text).to_string(),
                    round_trips: 1,
                    invocations: Vec::new(),
                }),
                ReplyBehavior::Fail(err) => Err(err.clone().into()),
            }
        }
    }

    /// In-memory store that counts every call.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryConversationStore,
        creates: AtomicUsize,
        loads: AtomicUsize,
        updates: AtomicUsize,
    }

    impl CountingStore {
        fn writes(&self) -> usize {
            self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConversationStore for CountingStore {
        async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create(conversation).await
        }

        async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(id).await
        }

        async fn update(&self, conversation: &Conversation) -> Result<(), StoreError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update(conversation).await
        }
    }

    fn service(store: &Arc<CountingStore>, assistant: &Arc<StubAssistant>) -> ChatService {
        ChatService::new(store.clone(), assistant.clone())
    }

    fn happy_assistant() -> Arc<StubAssistant> {
        StubAssistant::new(
            TitleBehavior::Fixed("Weather in Barcelona"),
            ReplyBehavior::Fixed("25°C and sunny"),
        )
    }

    #[tokio::test]
    async fn start_builds_titled_two_message_conversation() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();

        let turn = service(&store, &assistant)
            .start_conversation("What's the weather in Barcelona?", &CancellationToken::new())
            .await
            .expect("start");

        let conversation = &turn.conversation;
        assert_eq!(conversation.title, "Weather in Barcelona");
        assert_eq!(conversation.message_count(), 2);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
        assert_eq!(
            conversation.messages[0].content,
            "What's the weather in Barcelona?"
        );
        assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
        assert_eq!(conversation.messages[1].content, "25°C and sunny");
        assert_eq!(turn.reply.text, "25°C and sunny");

        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(store.updates.load(Ordering::SeqCst), 0);
        let stored = store.inner.load(conversation.id).await.expect("stored");
        assert_eq!(&stored, conversation);
    }

    #[tokio::test]
    async fn title_only_sees_the_user_message() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();

        service(&store, &assistant)
            .start_conversation("hola", &CancellationToken::new())
            .await
            .expect("start");

        assert_eq!(*assistant.title_saw_messages.lock().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn title_failure_keeps_default_title() {
        let store = Arc::new(CountingStore::default());
        let assistant =
            StubAssistant::new(TitleBehavior::Fail, ReplyBehavior::Fixed("25°C and sunny"));

        let turn = service(&store, &assistant)
            .start_conversation("What's the weather in Barcelona?", &CancellationToken::new())
            .await
            .expect("start");

        assert_eq!(turn.conversation.title, DEFAULT_TITLE);
        assert_eq!(turn.conversation.message_count(), 2);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reply_failure_persists_nothing_and_cancels_title() {
        let store = Arc::new(CountingStore::default());
        let assistant = StubAssistant::new(
            TitleBehavior::UntilCancelled,
            ReplyBehavior::Fail(AgentError::ModelUnavailable),
        );

        let err = service(&store, &assistant)
            .start_conversation("What's the weather in Barcelona?", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.current_context(), &ChatError::ModelUnavailable);
        assert_eq!(store.writes(), 0);
        assert!(store.inner.is_empty().await);
        assert!(*assistant.title_was_cancelled.lock().unwrap());
    }

    #[tokio::test]
    async fn reply_failure_kind_is_preserved() {
        for (failure, expected) in [
            (AgentError::EmptyReply, ChatError::EmptyReply),
            (
                AgentError::LoopBoundExceeded { max: 6 },
                ChatError::LoopBoundExceeded { max: 6 },
            ),
        ] {
            let store = Arc::new(CountingStore::default());
            let assistant =
                StubAssistant::new(TitleBehavior::Fixed("t"), ReplyBehavior::Fail(failure));
            let err = service(&store, &assistant)
                .start_conversation("hi", &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.current_context(), &expected);
            assert_eq!(store.writes(), 0);
        }
    }

    #[tokio::test]
    async fn start_rejects_blank_message_before_any_model_call() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();

        for message in ["", "   \n\t"] {
            let err = service(&store, &assistant)
                .start_conversation(message, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(
                err.current_context(),
                &ChatError::InvalidArgument { field: "message" }
            );
        }
        assert_eq!(assistant.model_calls(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn caller_cancellation_fails_start() {
        let store = Arc::new(CountingStore::default());
        let assistant = StubAssistant::new(
            TitleBehavior::UntilCancelled,
            ReplyBehavior::Fail(AgentError::Cancelled),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service(&store, &assistant)
            .start_conversation("hi", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.current_context(), &ChatError::Cancelled);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn continue_appends_user_and_assistant_messages() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();
        let chat = service(&store, &assistant);

        let started = chat
            .start_conversation("What's the weather in Barcelona?", &CancellationToken::new())
            .await
            .expect("start");
        let id = started.conversation.id.to_string();

        let turn = chat
            .continue_conversation(&id, "And tomorrow?", &CancellationToken::new())
            .await
            .expect("continue");

        let roles: Vec<_> = turn.conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(turn.conversation.messages[2].content, "And tomorrow?");
        assert_eq!(turn.conversation.title, "Weather in Barcelona");
        assert!(turn.conversation.updated_at >= started.conversation.updated_at);
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);

        let stored = store.inner.load(started.conversation.id).await.expect("stored");
        assert_eq!(stored.message_count(), 4);
    }

    #[tokio::test]
    async fn continue_unknown_conversation_is_not_found() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();
        let id = ConversationId::new();

        let err = service(&store, &assistant)
            .continue_conversation(&id.to_string(), "hello?", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &ChatError::NotFound { id: id.to_string() }
        );
        assert_eq!(store.writes(), 0);
        assert_eq!(assistant.model_calls(), 0);
    }

    #[tokio::test]
    async fn continue_validates_inputs_before_any_call() {
        let store = Arc::new(CountingStore::default());
        let assistant = happy_assistant();
        let chat = service(&store, &assistant);
        let valid_id = ConversationId::new().to_string();

        let cases = [
            ("", "hi", "conversation_id"),
            ("  ", "hi", "conversation_id"),
            ("conv_not-a-ulid", "hi", "conversation_id"),
            (valid_id.as_str(), "", "message"),
            (valid_id.as_str(), "  ", "message"),
        ];
        for (id, message, field) in cases {
            let err = chat
                .continue_conversation(id, message, &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.current_context(), &ChatError::InvalidArgument { field });
        }

        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes(), 0);
        assert_eq!(assistant.model_calls(), 0);
    }

    #[tokio::test]
    async fn continue_reply_failure_persists_nothing() {
        let store = Arc::new(CountingStore::default());
        let seeded = Conversation::start("hi");
        store.inner.create(&seeded).await.expect("seed");

        let assistant = StubAssistant::new(
            TitleBehavior::Fixed("t"),
            ReplyBehavior::Fail(AgentError::ModelUnavailable),
        );
        let err = service(&store, &assistant)
            .continue_conversation(&seeded.id.to_string(), "again", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.current_context(), &ChatError::ModelUnavailable);
        assert_eq!(store.writes(), 0);
        let stored = store.inner.load(seeded.id).await.expect("stored");
        assert_eq!(stored.message_count(), 1);
    }
}
