//! Travel orchestrator - LLM turn orchestration for a travel assistant
//!
//! Classifies each inbound turn, prompts the model with the tool for the
//! session's intent, and dispatches any tool call the model emits to the
//! matching travel or policy backend.

mod api;
mod chat_template;
mod classify;
mod config;
mod db;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;
mod tool_call;
mod tools;

use api::{create_router, AppState};
use classify::HttpClassifier;
use config::Config;
use db::Database;
use llm::{CompletionService, LoggingService, StaticCredentials};
use runtime::{DatabaseStorage, SessionManager, TurnRunner};
use std::net::SocketAddr;
use std::sync::Arc;
use system_prompt::ToolCatalog;
use tools::{Dispatcher, HttpToolBackend, RouteTable};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_orchestrator=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    // Tool catalog and routing table are immutable after startup
    let catalog = Arc::new(ToolCatalog::load(&config.catalog_path)?);
    tracing::info!(
        path = %config.catalog_path.display(),
        intents = catalog.intent_count(),
        "Tool catalog loaded"
    );
    tracing::debug!(intents = ?catalog.intents(), "Configured intents");

    let routes = Arc::new(RouteTable::standard(&config.routes)?);
    tracing::info!(
        tools = routes.len(),
        overrides = config.routes.overrides.len(),
        "Tool routes built"
    );

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening session database");
    let db = Database::open(&config.db_path)?;
    let purged = db.purge_expired(config.session_ttl)?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired sessions");
    }

    let credentials = Arc::new(StaticCredentials::new(config.api_key.clone()));
    let completion = CompletionService::new(
        config.inference_url.clone(),
        config.model_id.clone(),
        credentials,
        config.timeouts.inference,
    )?;
    let llm = Arc::new(LoggingService::new(Arc::new(completion)));

    let dispatcher = Dispatcher::new(
        routes,
        Arc::new(HttpToolBackend::new(config.tool_timeout)?),
        config.tool_timeout,
    );

    let runner = TurnRunner::new(
        Arc::new(HttpClassifier::intent(
            config.intent_url.clone(),
            config.timeouts.classify,
        )?),
        Arc::new(HttpClassifier::sentiment(
            config.sentiment_url.clone(),
            config.timeouts.classify,
        )?),
        llm,
        Arc::new(dispatcher),
        config.timeouts,
    );

    let sessions = Arc::new(SessionManager::new(
        Arc::new(DatabaseStorage::new(db, config.session_ttl)),
        runner,
        catalog,
        config.generation.clone(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(AppState::new(sessions))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, model = %config.model_id, "Travel orchestrator listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
