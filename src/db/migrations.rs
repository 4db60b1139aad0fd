//! Schema versioning for the document store.
//!
//! The initial schema (version 1) is created by [`crate::db::schema`]; future
//! revisions append their SQL to [`MIGRATIONS`] and run forward-only. The
//! `schema_meta` table also records which embedding model produced the stored
//! vectors, so a configuration change can be detected before incomparable
//! vectors end up in the same index.

use rusqlite::{Connection, OptionalExtension};

/// Migration SQL batches. Entry `i` upgrades version `i + 1` to `i + 2`;
/// version 1 is the initial schema and has no entry here.
const MIGRATIONS: &[&str] = &[];

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32 + 1;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: String = conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    Ok(raw.parse().unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Apply any pending migrations, in order.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let version = get_schema_version(conn)?;
    tracing::debug!(
        schema_version = version,
        target = CURRENT_SCHEMA_VERSION,
        "checking migrations"
    );

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let target = idx as u32 + 2;
        if target <= version {
            continue;
        }
        tracing::info!(from = target - 1, to = target, "running migration");
        conn.execute_batch(sql)?;
        set_schema_version(conn, target)?;
    }

    Ok(())
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'embedding_model'",
        [],
        |row| row.get(0),
    )
    .optional()
}

/// Set the stored embedding model identifier.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// Record the configured embedding model the first time a store is opened.
///
/// Returns the previously stored identifier when it disagrees with the
/// configuration. The stored value stays untouched on mismatch: the existing
/// vectors were built with it, and overwriting would hide that the index now
/// mixes models.
pub fn ensure_embedding_model(
    conn: &Connection,
    configured: &str,
) -> rusqlite::Result<Option<String>> {
    match get_embedding_model(conn)? {
        None => {
            set_embedding_model(conn, configured)?;
            Ok(None)
        }
        Some(stored) if stored == configured => Ok(None),
        Some(stored) => Ok(Some(stored)),
    }
}
