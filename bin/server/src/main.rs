use parley_ai::{ModelAssistant, OpenAiGateway};
use parley_chat::ChatService;
use parley_conversation::{ConversationStore, InMemoryConversationStore};
use parley_server::{
    app::{self, AppState},
    config::ServerConfig,
    db::PgConversationStore,
    error::StartupError,
};
use parley_tools::{ToolRegistry, builtin_tools};
use rootcause::Report;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Report<StartupError>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().map_err(|e| StartupError::Configuration {
        details: e.to_string(),
    })?;
    tracing::info!(model = %config.model.name, "loaded configuration");

    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| StartupError::HttpClient {
            details: e.to_string(),
        })?;

    let registry = ToolRegistry::new(builtin_tools(&config.tools, client.clone()))
        .with_timeout(config.agent.tool_timeout());
    tracing::info!(tools = registry.len(), "registered tools");

    let gateway = Arc::new(OpenAiGateway::new(client, config.model.clone()));
    let assistant = Arc::new(ModelAssistant::new(
        gateway,
        Arc::new(registry),
        config.agent.agent_config(),
    ));

    let store = open_store(config.database_url.as_deref()).await?;
    let state = AppState::new(ChatService::new(store, assistant));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| StartupError::Serve {
            details: e.to_string(),
        })?;
    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StartupError::Serve {
            details: e.to_string(),
        })?;

    tracing::info!("server stopped");
    Ok(())
}

async fn open_store(
    database_url: Option<&str>,
) -> Result<Arc<dyn ConversationStore>, Report<StartupError>> {
    let Some(url) = database_url else {
        tracing::warn!("DATABASE_URL not set, conversations are kept in memory");
        return Ok(Arc::new(InMemoryConversationStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    tracing::info!("running database migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StartupError::Database {
            details: e.to_string(),
        })?;

    Ok(Arc::new(PgConversationStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
