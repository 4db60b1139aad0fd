//! Collective — a retrieval-augmented chat service over community knowledge.
//!
//! Free-text contributions are embedded and stored in a local vector index
//! (the "collective memory"); chat queries retrieve the most similar stored
//! documents and feed them as context to a locally hosted causal language
//! model.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   for nearest-neighbor search
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Generation**: Local ONNX Runtime with TinyLlama-1.1B-Chat and
//!   temperature/top-k/top-p sampling
//! - **Transport**: HTTP (axum) plus a terminal chat REPL
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`embedding`] — Text-to-vector embedding via ONNX Runtime
//! - [`generation`] — Causal-LM text generation and token sampling
//! - [`knowledge`] — The collective memory: document storage, retrieval, stats
//! - [`prompt`] — Chat prompt assembly in the TinyLlama format
//! - [`pipeline`] — The RAG chat turn shared by HTTP and the REPL
//! - [`api`] — HTTP surface: router, handlers, error mapping
//! - [`server`] — Server startup and shared-state wiring

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod generation;
pub mod knowledge;
pub mod pipeline;
pub mod prompt;
pub mod server;
