#![allow(dead_code)]

use anyhow::Result;
use collective::api::AppState;
use collective::config::CollectiveConfig;
use collective::db;
use collective::embedding::Embedder;
use collective::generation::TextGenerator;
use collective::knowledge::store::add_document;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Generate a deterministic 384-dim embedding with a spike at position `seed`.
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 384];
    v[seed % 384] = 1.0;
    v
}

/// Insert a test document. Returns its ID.
pub fn insert_document(
    conn: &mut Connection,
    content: &str,
    contributor: &str,
    embedding: &[f32],
) -> String {
    add_document(conn, content, contributor, "contribution", embedding)
        .unwrap()
        .id
}

/// Deterministic embedder for router tests: a unit spike at a position
/// derived from the first byte of the text.
pub struct SpikeEmbedder;

impl Embedder for SpikeEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(test_embedding(text.bytes().next().unwrap_or(0) as usize))
    }
}

/// Generator that echoes a canned reply; optionally fails to exercise the
/// 500 path.
pub struct StubGenerator {
    pub reply: String,
    pub fail: bool,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
        }
    }
}

impl TextGenerator for StubGenerator {
    fn generate(&self, _prompt: &str) -> Result<String> {
        if self.fail {
            anyhow::bail!("neural core offline");
        }
        Ok(self.reply.clone())
    }
}

/// Build an [`AppState`] over an in-memory database with the mock embedder
/// and the given generator.
pub fn test_state(generator: StubGenerator) -> AppState {
    AppState::new(
        Arc::new(Mutex::new(test_db())),
        Arc::new(SpikeEmbedder),
        Arc::new(generator),
        Arc::new(CollectiveConfig::default()),
    )
}
