pub mod chat;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const EMBEDDING_MODEL_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx";
const EMBEDDING_TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";
const GENERATOR_MODEL_URL: &str =
    "https://huggingface.co/onnx-community/TinyLlama-1.1B-Chat-v1.0-ONNX/resolve/main/onnx/model.onnx";
const GENERATOR_TOKENIZER_URL: &str =
    "https://huggingface.co/onnx-community/TinyLlama-1.1B-Chat-v1.0-ONNX/resolve/main/tokenizer.json";

/// Download the embedding and generation models to their cache directories.
pub async fn model_download(config: &crate::config::CollectiveConfig) -> Result<()> {
    let embedding_dir = crate::config::expand_tilde(&config.embedding.cache_dir);
    fetch_if_missing(EMBEDDING_MODEL_URL, &embedding_dir.join("model.onnx"), "embedding model (~90MB)").await?;
    fetch_if_missing(
        EMBEDDING_TOKENIZER_URL,
        &embedding_dir.join("tokenizer.json"),
        "embedding tokenizer",
    )
    .await?;

    let generator_dir = crate::config::expand_tilde(&config.generation.cache_dir);
    fetch_if_missing(GENERATOR_MODEL_URL, &generator_dir.join("model.onnx"), "generation model (~2GB)").await?;
    fetch_if_missing(
        GENERATOR_TOKENIZER_URL,
        &generator_dir.join("tokenizer.json"),
        "generation tokenizer",
    )
    .await?;

    println!("Model download complete. Ready for use.");
    Ok(())
}

async fn fetch_if_missing(url: &str, dest: &Path, label: &str) -> Result<()> {
    if dest.exists() {
        println!("{label} already exists at {}", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create cache dir: {}", parent.display()))?;
    }
    println!("Downloading {label}...");
    download_file(url, &dest.to_path_buf()).await?;
    println!("Saved to {}", dest.display());
    Ok(())
}

/// Download a file from a URL with progress bar. Uses atomic write (tmp + rename).
async fn download_file(url: &str, dest: &PathBuf) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;

    anyhow::ensure!(
        response.status().is_success(),
        "download failed with HTTP {}",
        response.status()
    );

    let pb = if let Some(size) = response.content_length() {
        let pb = ProgressBar::new(size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                .expect("valid template")
                .progress_chars("##-"),
        );
        pb
    } else {
        ProgressBar::new_spinner()
    };

    let tmp_path = dest.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk).await.context("error writing to file")?;
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .context("failed to rename temp file")?;

    pb.finish_and_clear();
    Ok(())
}
