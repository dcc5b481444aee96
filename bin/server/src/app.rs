//! Application state and router.

use crate::routes::{
    self, CONTINUE_CONVERSATION_PATH, START_CONVERSATION_PATH,
};
use axum::Router;
use axum::routing::{get, post};
use parley_chat::ChatService;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The conversation flow.
    pub chat: ChatService,
}

impl AppState {
    /// Creates a new application state.
    #[must_use]
    pub fn new(chat: ChatService) -> Self {
        Self { chat }
    }
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::greeting))
        .route(START_CONVERSATION_PATH, post(routes::start_conversation))
        .route(
            CONTINUE_CONVERSATION_PATH,
            post(routes::continue_conversation),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
