//! Local ONNX Runtime embedder.
//!
//! Runs all-MiniLM-L6-v2 via `ort`: tokenization, encoder inference,
//! attention-masked mean pooling, and L2 normalization.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::{Embedder, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

/// Local ONNX-based embedder using all-MiniLM-L6-v2.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync; the Session is only touched while the
// Mutex is held.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let session = load_session(&cache_dir.join("model.onnx"))?;
        let tokenizer = load_tokenizer(&cache_dir.join("tokenizer.json"))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

fn load_session(model_path: &Path) -> Result<Session> {
    anyhow::ensure!(
        model_path.exists(),
        "ONNX embedding model not found at {}. Run `collective model download` first.",
        model_path.display()
    );

    let session = Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)
        .context("failed to load embedding ONNX model")?;

    tracing::info!(model = %model_path.display(), "embedding model loaded");
    Ok(session)
}

fn load_tokenizer(tokenizer_path: &Path) -> Result<Tokenizer> {
    anyhow::ensure!(
        tokenizer_path.exists(),
        "Tokenizer not found at {}. Run `collective model download` first.",
        tokenizer_path.display()
    );

    let mut tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| anyhow::anyhow!("failed to load embedding tokenizer: {e}"))?;

    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length: MAX_SEQ_LEN,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

    tracing::info!(tokenizer = %tokenizer_path.display(), "embedding tokenizer loaded");
    Ok(tokenizer)
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let seq_len = encoding.get_ids().len();
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();

        let shape = vec![1i64, seq_len as i64];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?;
        let attention_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))?;
        // token_type_ids: all zeros (single sentence)
        let token_type_tensor =
            Tensor::from_array((shape, vec![0i64; seq_len].into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("embedding session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_tensor,
            "token_type_ids" => token_type_tensor,
        })?;

        // Token embeddings have shape [1, seq_len, 384]. The output name varies
        // by ONNX export, so try the common ones and fall back to index 0.
        let token_embeddings = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (out_shape, data) = token_embeddings
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &out_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape: {dims:?}, expected [1, seq, {EMBEDDING_DIM}]"
        );
        let out_seq_len = dims[1] as usize;

        let pooled = masked_mean_pool(data, &attention_mask, out_seq_len, EMBEDDING_DIM);
        Ok(l2_normalize(&pooled))
    }
}

/// Mean-pool token embeddings over positions with a non-zero attention mask.
fn masked_mean_pool(data: &[f32], mask: &[i64], seq_len: usize, dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut count = 0.0f32;

    for (pos, &m) in mask.iter().take(seq_len).enumerate() {
        if m == 0 {
            continue;
        }
        let token = &data[pos * dim..(pos + 1) * dim];
        for (acc, &x) in pooled.iter_mut().zip(token) {
            *acc += x;
        }
        count += 1.0;
    }

    if count > 0.0 {
        for acc in &mut pooled {
            *acc /= count;
        }
    }
    pooled
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit_norm() {
        let v = vec![3.0, 4.0];
        let normalized = l2_normalize(&v);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(l2_normalize(&v), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn mean_pool_respects_mask() {
        // Two tokens of dim 2; only the first is attended
        let data = vec![1.0, 3.0, 100.0, 100.0];
        let mask = vec![1i64, 0];
        let pooled = masked_mean_pool(&data, &mask, 2, 2);
        assert_eq!(pooled, vec![1.0, 3.0]);
    }

    #[test]
    fn mean_pool_averages_attended_tokens() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let mask = vec![1i64, 1];
        let pooled = masked_mean_pool(&data, &mask, 2, 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let mask = vec![0i64, 0];
        let pooled = masked_mean_pool(&data, &mask, 2, 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig::default()
    }

    #[test]
    #[ignore] // Requires model files — run with: cargo test -- --ignored
    fn embed_produces_384_normalized_dims() {
        let embedder = OnnxEmbedder::new(&test_config()).unwrap();
        let embedding = embedder.embed("Hello world").unwrap();
        assert_eq!(embedding.len(), EMBEDDING_DIM);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "L2 norm should be ~1.0, got {norm}");
    }

    #[test]
    #[ignore]
    fn embed_is_deterministic() {
        let embedder = OnnxEmbedder::new(&test_config()).unwrap();
        let a = embedder.embed("Rust is a systems programming language").unwrap();
        let b = embedder.embed("Rust is a systems programming language").unwrap();
        assert_eq!(a, b, "same input must produce identical output");
    }

    #[test]
    #[ignore]
    fn similar_texts_are_closer_than_unrelated_ones() {
        let embedder = OnnxEmbedder::new(&test_config()).unwrap();
        let a = embedder.embed("The cat sat on the mat").unwrap();
        let b = embedder.embed("A cat was sitting on a mat").unwrap();
        let c = embedder.embed("Quantum computing uses qubits").unwrap();

        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(p, q)| p * q).sum() };
        assert!(dot(&a, &b) > dot(&a, &c));
    }
}
