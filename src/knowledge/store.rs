//! Write path — document and embedding insertion.
//!
//! [`add_document`] is the single entry point. The document row and its
//! embedding vector are written inside one transaction so the `documents` and
//! `documents_vec` tables never diverge.

use anyhow::Result;
use rusqlite::{params, Connection, Transaction};

use crate::knowledge::embedding_to_bytes;

/// Result returned from a store operation.
#[derive(Debug)]
pub struct StoredDocument {
    /// UUID of the stored document.
    pub id: String,
    /// ISO 8601 timestamp the document was recorded at.
    pub created_at: String,
}

/// Store a contribution and its embedding atomically.
///
/// Content validation (length bounds) happens at the API boundary; by the time
/// a contribution reaches this function it is accepted.
pub fn add_document(
    conn: &mut Connection,
    content: &str,
    contributor: &str,
    source: &str,
    embedding: &[f32],
) -> Result<StoredDocument> {
    let tx = conn.transaction()?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    insert_document(&tx, &id, content, contributor, source, &now)?;
    insert_embedding(&tx, &id, embedding)?;

    tx.commit()?;

    tracing::info!(id = %id, contributor = %contributor, "document stored");
    Ok(StoredDocument {
        id,
        created_at: now,
    })
}

fn insert_document(
    tx: &Transaction,
    id: &str,
    content: &str,
    contributor: &str,
    source: &str,
    created_at: &str,
) -> Result<()> {
    tx.execute(
        "INSERT INTO documents (id, content, contributor, source, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, content, contributor, source, created_at],
    )?;
    Ok(())
}

fn insert_embedding(tx: &Transaction, id: &str, embedding: &[f32]) -> Result<()> {
    let embedding_bytes = embedding_to_bytes(embedding);
    tx.execute(
        "INSERT INTO documents_vec (id, embedding) VALUES (?1, ?2)",
        params![id, embedding_bytes],
    )?;
    Ok(())
}
