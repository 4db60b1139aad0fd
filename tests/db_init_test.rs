mod helpers;

use collective::db::{self, migrations};
use collective::knowledge::search::search_documents;
use helpers::{insert_document, test_embedding};

#[test]
fn open_database_creates_file_and_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("collective_memory.db");

    let conn = db::open_database(&path).unwrap();
    assert!(path.exists());

    assert_eq!(
        migrations::get_schema_version(&conn).unwrap(),
        migrations::CURRENT_SCHEMA_VERSION
    );
    // The embedding model is recorded at server startup, not at open
    assert!(migrations::get_embedding_model(&conn).unwrap().is_none());
}

#[test]
fn embedding_model_recorded_once_and_mismatch_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collective_memory.db");

    {
        let conn = db::open_database(&path).unwrap();
        assert!(migrations::ensure_embedding_model(&conn, "all-MiniLM-L6-v2")
            .unwrap()
            .is_none());
    }

    // A reopen with a different configured model reports the stored one
    let conn = db::open_database(&path).unwrap();
    let mismatch = migrations::ensure_embedding_model(&conn, "some-other-model").unwrap();
    assert_eq!(mismatch.as_deref(), Some("all-MiniLM-L6-v2"));
}

#[test]
fn documents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collective_memory.db");

    let emb = test_embedding(42);
    let id = {
        let mut conn = db::open_database(&path).unwrap();
        insert_document(&mut conn, "a durable piece of knowledge", "alice", &emb)
    };

    let conn = db::open_database(&path).unwrap();
    let results = search_documents(&conn, &emb, 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, id);
    assert_eq!(results[0].document.content, "a durable piece of knowledge");
}

#[test]
fn reopening_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collective_memory.db");

    for _ in 0..3 {
        let conn = db::open_database(&path).unwrap();
        assert_eq!(
            migrations::get_schema_version(&conn).unwrap(),
            migrations::CURRENT_SCHEMA_VERSION
        );
    }
}
