//! Text-to-vector embedding.
//!
//! Provides the [`Embedder`] trait and a local ONNX implementation using
//! all-MiniLM-L6-v2 (384 dimensions, L2-normalized). Construct via
//! [`create_embedder`] from configuration.

pub mod local;

use anyhow::Result;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations produce L2-normalized vectors of exactly [`EMBEDDING_DIM`]
/// dimensions. Methods are synchronous — async callers should wrap calls in
/// `tokio::task::spawn_blocking`.
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Number of dimensions this embedder produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedder from config.
///
/// Currently only `"local"` is supported (ONNX Runtime + all-MiniLM-L6-v2).
/// Returns an error if model files are missing — run `collective model download`
/// first.
pub fn create_embedder(config: &crate::config::EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match config.provider.as_str() {
        "local" => {
            let embedder = local::OnnxEmbedder::new(config)?;
            Ok(Box::new(embedder))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local"),
    }
}
