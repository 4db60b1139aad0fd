//! Request handlers for the three HTTP endpoints.
//!
//! Embedding, database work, and generation are all CPU-bound or blocking, so
//! each handler moves that work onto the blocking thread pool.

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use super::error::ApiError;
use super::types::{
    ChatRequest, ChatResponse, ContributeRequest, ContributeResponse, StatusResponse,
};
use super::AppState;
use crate::knowledge::stats::document_count;
use crate::knowledge::store::add_document;
use crate::pipeline;

/// `GET /` — health/status payload with the current document count.
pub async fn home(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let db = Arc::clone(&state.db);
    let documents = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        document_count(&conn)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("db task failed: {e}")))??;

    Ok(Json(StatusResponse {
        status: "Collective AI Server Running".into(),
        documents,
    }))
}

/// `POST /api/contribute` — validate, embed, and store a contribution.
pub async fn contribute(
    State(state): State<AppState>,
    Json(request): Json<ContributeRequest>,
) -> Result<Json<ContributeResponse>, ApiError> {
    let text = request.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Content cannot be empty".into()));
    }

    let chars = text.chars().count();
    if chars < state.config.retrieval.min_contribution_chars {
        return Err(ApiError::BadRequest("Content too short or invalid".into()));
    }
    if chars > state.config.retrieval.max_contribution_chars {
        return Err(ApiError::BadRequest("Content too long".into()));
    }

    let contributor = request.user_id.unwrap_or_else(|| "anonymous".into());
    tracing::info!(chars, contributor = %contributor, "contribution received");

    // Embed (CPU-heavy)
    let embedder = Arc::clone(&state.embedder);
    let text_for_embed = text.clone();
    let embedding = tokio::task::spawn_blocking(move || embedder.embed(&text_for_embed))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("embedding task failed: {e}")))??;

    // Store (blocking DB write)
    let db = Arc::clone(&state.db);
    let contributor_owned = contributor.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        add_document(&mut conn, &text, &contributor_owned, "contribution", &embedding)
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("db task failed: {e}")))??;

    Ok(Json(ContributeResponse {
        status: "success".into(),
        message: "Knowledge assimilated into the Collective.".into(),
    }))
}

/// `POST /api/chat` — the RAG workflow: retrieve context, generate a reply.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }

    tracing::info!(
        chars = message.len(),
        session = ?request.session_id,
        user = ?request.user_id,
        "chat message received"
    );

    let state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        pipeline::chat_reply(
            &state.db,
            state.embedder.as_ref(),
            state.generator.as_ref(),
            &state.config,
            &message,
        )
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("chat task failed: {e}")))??;

    Ok(Json(ChatResponse {
        reply: outcome.reply,
    }))
}
