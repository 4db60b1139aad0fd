//! The RAG chat pipeline: embed → retrieve → assemble prompt → generate.
//!
//! One synchronous implementation shared by the HTTP chat endpoint and the
//! terminal chat REPL. Async callers wrap the whole turn in
//! `tokio::task::spawn_blocking`.

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Mutex;

use crate::config::CollectiveConfig;
use crate::embedding::Embedder;
use crate::generation::TextGenerator;
use crate::knowledge::search::search_documents;
use crate::prompt::build_prompt;

/// Result of a single chat turn.
#[derive(Debug)]
pub struct ChatOutcome {
    /// The generated reply.
    pub reply: String,
    /// How many retrieved documents went into the prompt.
    pub context_used: usize,
}

/// Run one full chat turn against the collective memory.
///
/// The database lock is held only for the retrieval step, so contributions
/// are not blocked while the model generates.
pub fn chat_reply(
    db: &Mutex<Connection>,
    embedder: &dyn Embedder,
    generator: &dyn TextGenerator,
    config: &CollectiveConfig,
    message: &str,
) -> Result<ChatOutcome> {
    let query_embedding = embedder.embed(message).context("failed to embed message")?;

    let retrieved = {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        search_documents(&conn, &query_embedding, config.retrieval.context_results)
            .context("context retrieval failed")?
    };
    if !retrieved.is_empty() {
        tracing::info!(fragments = retrieved.len(), "retrieved context fragments");
    }

    let context_docs: Vec<String> = retrieved.into_iter().map(|r| r.document.content).collect();
    let prompt = build_prompt(&config.generation.system_prompt, &context_docs, message);

    let reply = generator.generate(&prompt).context("generation failed")?;

    Ok(ChatOutcome {
        reply,
        context_used: context_docs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::knowledge::store::add_document;
    use std::sync::Mutex;

    /// Deterministic embedder: a unit spike at a position derived from the
    /// first byte of the text.
    struct SpikeEmbedder;

    impl Embedder for SpikeEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 384];
            let dim = text.bytes().next().unwrap_or(0) as usize % 384;
            v[dim] = 1.0;
            Ok(v)
        }
    }

    /// Generator that records the prompt it saw and returns a canned reply.
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingGenerator {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for RecordingGenerator {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("canned reply".to_string())
        }
    }

    #[test]
    fn chat_turn_feeds_retrieved_context_to_the_generator() {
        let mut conn = db::open_memory_database().unwrap();
        let embedder = SpikeEmbedder;
        let config = CollectiveConfig::default();

        // Same first byte as the query, so the spike matches at distance 0
        let emb = embedder.embed("query target document").unwrap();
        add_document(&mut conn, "query target document", "a", "contribution", &emb).unwrap();
        let db = Mutex::new(conn);

        let generator = RecordingGenerator::new();
        let outcome = chat_reply(&db, &embedder, &generator, &config, "question").unwrap();

        assert_eq!(outcome.reply, "canned reply");
        assert_eq!(outcome.context_used, 1);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("- query target document"));
        assert!(prompts[0].contains("question"));
    }

    #[test]
    fn empty_store_still_generates() {
        let db = Mutex::new(db::open_memory_database().unwrap());
        let embedder = SpikeEmbedder;
        let generator = RecordingGenerator::new();
        let config = CollectiveConfig::default();

        let outcome = chat_reply(&db, &embedder, &generator, &config, "hello").unwrap();

        assert_eq!(outcome.reply, "canned reply");
        assert_eq!(outcome.context_used, 0);
        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("CONTEXT FROM COLLECTIVE MEMORY"));
    }

    #[test]
    fn retrieval_is_capped_at_configured_results() {
        let mut conn = db::open_memory_database().unwrap();
        let embedder = SpikeEmbedder;
        let mut config = CollectiveConfig::default();
        config.retrieval.context_results = 2;

        for i in 0..5 {
            // All share the query's first byte, so all sit at distance 0
            let text = format!("query doc {i}");
            let emb = embedder.embed(&text).unwrap();
            add_document(&mut conn, &text, "a", "contribution", &emb).unwrap();
        }
        let db = Mutex::new(conn);

        let generator = RecordingGenerator::new();
        let outcome = chat_reply(&db, &embedder, &generator, &config, "question").unwrap();
        assert_eq!(outcome.context_used, 2);
    }
}
