use std::sync::Arc;

use crate::auth::session::SessionManager;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: wicket_db::DbPool,
    /// Server configuration (cookie policy, setup marker path, timeouts).
    pub config: Arc<ServerConfig>,
    /// Session lifecycle manager over the injected session store.
    pub sessions: SessionManager,
}
