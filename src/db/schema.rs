//! SQL DDL for the collective memory store.
//!
//! Defines the `documents` table, the `documents_vec` (vec0) virtual table
//! holding one embedding per document, and the `schema_meta` key/value table.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Contributed knowledge
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    contributor TEXT NOT NULL DEFAULT 'anonymous',
    source TEXT NOT NULL DEFAULT 'contribution',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_contributor ON documents(contributor);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);

-- Schema metadata (version, embedding model identifier)
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 virtual table must be created separately (sqlite-vec syntax).
const VEC_TABLE_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS documents_vec USING vec0(
    id TEXT PRIMARY KEY,
    embedding FLOAT[384]
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(VEC_TABLE_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
