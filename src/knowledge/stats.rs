use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Store statistics, reported by the `stats` CLI command.
#[derive(Debug, Serialize)]
pub struct KnowledgeStats {
    pub total_documents: u64,
    pub contributors: u64,
    pub by_source: HashMap<String, u64>,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_document: Option<String>,
}

/// Compute store statistics.
///
/// `db_path` is used for file size calculation; pass `None` for in-memory
/// databases.
pub fn knowledge_stats(conn: &Connection, db_path: Option<&Path>) -> Result<KnowledgeStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
    let contributors: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT contributor) FROM documents",
        [],
        |row| row.get(0),
    )?;

    let mut by_source = HashMap::new();
    let mut stmt = conn.prepare("SELECT source, COUNT(*) FROM documents GROUP BY source")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (source, count) in rows {
        by_source.insert(source, count as u64);
    }

    let range: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM documents",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (oldest, newest) = range.unwrap_or((None, None));

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(KnowledgeStats {
        total_documents: total as u64,
        contributors: contributors as u64,
        by_source,
        db_size_bytes,
        oldest_document: oldest,
        newest_document: newest,
    })
}

/// Count all documents. Used by the status endpoint.
pub fn document_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
    Ok(count as u64)
}
