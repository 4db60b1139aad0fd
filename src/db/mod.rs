//! Database bootstrap for the collective memory store.
//!
//! Every connection goes through the same sequence: register sqlite-vec,
//! apply connection pragmas, create the schema, run pending migrations.

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register sqlite-vec as an auto extension, once per process. Must happen
/// before any connection that touches `documents_vec` is opened.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the collective memory database at `path` and bring it up
/// to the current schema, creating parent directories as needed.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    load_sqlite_vec();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create data dir {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    prepare_connection(&conn)?;

    tracing::info!(path = %path.display(), "collective memory store ready");
    Ok(conn)
}

/// Open an in-memory database for testing.
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    prepare_connection(&conn)?;
    Ok(conn)
}

/// Pragmas, schema, and migrations applied to every new connection.
fn prepare_connection(conn: &Connection) -> Result<()> {
    // WAL keeps contributions readable while a chat turn holds the writer
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    schema::init_schema(conn).context("failed to initialize schema")?;
    migrations::run_migrations(conn).context("failed to run migrations")?;
    Ok(())
}
