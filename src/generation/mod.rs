//! Text generation with a locally hosted causal language model.
//!
//! Provides the [`TextGenerator`] trait, a local ONNX implementation running
//! TinyLlama-1.1B-Chat via `ort`, and the token [`sampler`] (temperature,
//! top-k, top-p). Construct via [`create_generator`] from configuration.

pub mod local;
pub mod sampler;

use anyhow::Result;

/// Trait for generating a completion from an already-assembled prompt.
///
/// Methods are synchronous and CPU-heavy — async callers should wrap calls in
/// `tokio::task::spawn_blocking`.
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt. Returns only the newly generated
    /// text, with special tokens stripped.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Create a text generator from config.
///
/// Currently only `"local"` is supported (ONNX Runtime + TinyLlama-1.1B-Chat).
/// Returns an error if model files are missing — run `collective model download`
/// first.
pub fn create_generator(
    config: &crate::config::GenerationConfig,
) -> Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "local" => {
            let generator = local::OnnxGenerator::new(config)?;
            Ok(Box::new(generator))
        }
        other => anyhow::bail!("unknown generation provider: {other}. Supported: local"),
    }
}
