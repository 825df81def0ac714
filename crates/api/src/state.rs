use std::sync::Arc;

use quire_core::store::PageStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Page storage (Postgres or in-memory).
    pub store: Arc<dyn PageStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
