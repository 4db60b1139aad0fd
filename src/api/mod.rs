//! HTTP API surface: router, shared state, handlers, and error mapping.

pub mod error;
pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::config::CollectiveConfig;
use crate::embedding::Embedder;
use crate::generation::TextGenerator;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn TextGenerator>,
    pub config: Arc<CollectiveConfig>,
}

impl AppState {
    pub fn new(
        db: Arc<Mutex<Connection>>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        config: Arc<CollectiveConfig>,
    ) -> Self {
        Self {
            db,
            embedder,
            generator,
            config,
        }
    }
}

/// Build the application router.
///
/// CORS is wide open: the service is meant to sit behind a browser frontend
/// served from a different origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/contribute", post(handlers::contribute))
        .route("/api/chat", post(handlers::chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
