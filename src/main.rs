//! gigboard server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gigboard::api;
use gigboard::app_state::AppState;
use gigboard::config::GatewayConfig;
use gigboard::domain::{Notifier, SessionRegistry};
use gigboard::persistence::MarketStore;
use gigboard::persistence::memory::MemoryStore;
use gigboard::persistence::postgres::PostgresStore;
use gigboard::service::MarketService;
use gigboard::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(addr = %config.listen_addr, "starting gigboard");

    // Build the store
    let store: Arc<dyn MarketStore> = if let Some(url) = &config.database_url {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(url)
            .await?;
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("postgres store ready");
        Arc::new(PostgresStore::new(pool, config.tx_lock_timeout_ms))
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory store");
        Arc::new(MemoryStore::new())
    };

    // One process-wide session registry, torn down with the process
    let sessions = Arc::new(SessionRegistry::new());
    let notifier = Notifier::new(Arc::clone(&sessions));

    // Build service layer
    let market_service = Arc::new(MarketService::new(store, notifier));

    // Build application state
    let app_state = AppState {
        market_service,
        sessions,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
