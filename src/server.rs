//! HTTP server startup.
//!
//! Wires config → database → embedder → generator into the axum router and
//! serves until ctrl-c.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};

use crate::api::{self, AppState};
use crate::config::CollectiveConfig;
use crate::db;
use crate::embedding;
use crate::generation;

/// Open the database and load both models. Returns the shared state handed to
/// the router (and reused by the terminal chat REPL).
pub fn build_state(config: CollectiveConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "collective memory ready");

    // Vectors from different embedding models are not comparable
    let mismatch = db::migrations::ensure_embedding_model(&conn, &config.embedding.model)
        .context("failed to record embedding model")?;
    if let Some(stored_model) = mismatch {
        tracing::warn!(
            stored = %stored_model,
            configured = %config.embedding.model,
            "embedding model changed — stored vectors were built with a different model"
        );
    }

    let db = Arc::new(Mutex::new(conn));

    let embedder: Arc<dyn embedding::Embedder> =
        Arc::from(embedding::create_embedder(&config.embedding)?);
    tracing::info!(model = %config.embedding.model, "embedder ready");

    let generator: Arc<dyn generation::TextGenerator> =
        Arc::from(generation::create_generator(&config.generation)?);
    tracing::info!(model = %config.generation.model, "generator ready");

    Ok(AppState::new(db, embedder, generator, Arc::new(config)))
}

/// Start the HTTP server and block until shutdown.
pub async fn serve(config: CollectiveConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    let state = build_state(config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "collective server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
