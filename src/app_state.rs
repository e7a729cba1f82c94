//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::SessionRegistry;
use crate::service::MarketService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Market service for all business logic.
    pub market_service: Arc<MarketService>,
    /// Session registry for WebSocket notification channels.
    pub sessions: Arc<SessionRegistry>,
}
