// Public API for integration tests and potential library usage

pub mod api;
pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod protocol;
pub mod state;
pub mod types;
pub mod ws;

use axum::{routing::get, Router};
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Build the full HTTP + WebSocket router
pub fn app(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::router())
        .nest_service("/home", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
