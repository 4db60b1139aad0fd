//! HTTP error mapping.
//!
//! Two outcomes only, matching the service's shallow error model: rejected
//! input becomes a 400 with the rejection message; everything else becomes a
//! 500 whose body never exposes internals. The cause is logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-side input rejection — surfaced verbatim with HTTP 400.
    #[error("{0}")]
    BadRequest(String),

    /// Embedding, retrieval, or generation failure — HTTP 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal AI Error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
