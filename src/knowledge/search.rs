//! Read path — nearest-neighbor retrieval over the vec0 index.
//!
//! KNN search happens in two steps, both against the same connection: the
//! vec0 MATCH query yields `(id, distance)` pairs, then the matching document
//! rows are hydrated and returned in distance order.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::HashMap;

use crate::knowledge::embedding_to_bytes;
use crate::knowledge::types::Document;

/// A retrieved document with its L2 distance to the query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDocument {
    #[serde(flatten)]
    pub document: Document,
    /// L2 distance reported by sqlite-vec (smaller is closer).
    pub distance: f64,
}

/// Find the `limit` documents nearest to the query embedding.
///
/// An empty store yields an empty vec, not an error.
pub fn search_documents(
    conn: &Connection,
    query_embedding: &[f32],
    limit: usize,
) -> Result<Vec<RetrievedDocument>> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let neighbors = knn(conn, query_embedding, limit)?;
    if neighbors.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<&str> = neighbors.iter().map(|(id, _)| id.as_str()).collect();
    let mut documents = fetch_documents(conn, &ids)?;

    // Reassemble in distance order
    let results = neighbors
        .into_iter()
        .filter_map(|(id, distance)| {
            documents
                .remove(&id)
                .map(|document| RetrievedDocument { document, distance })
        })
        .collect();

    Ok(results)
}

/// vec0 KNN query: `(id, distance)` ordered by ascending distance.
fn knn(conn: &Connection, embedding: &[f32], limit: usize) -> Result<Vec<(String, f64)>> {
    let embedding_bytes = embedding_to_bytes(embedding);
    let mut stmt = conn.prepare(
        "SELECT id, distance FROM documents_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let results = stmt
        .query_map(params![embedding_bytes, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

/// Batch-fetch document rows by ID.
fn fetch_documents(conn: &Connection, ids: &[&str]) -> Result<HashMap<String, Document>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT id, content, contributor, source, created_at \
         FROM documents WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let sql_params: Vec<&dyn rusqlite::types::ToSql> = ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(sql_params.as_slice(), |row| {
            Ok(Document {
                id: row.get(0)?,
                content: row.get(1)?,
                contributor: row.get(2)?,
                source: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = HashMap::new();
    for doc in rows {
        map.insert(doc.id.clone(), doc);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::knowledge::store::add_document;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    /// Unit vector along the given dimension.
    fn embedding(dim: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; 384];
        v[dim % 384] = 1.0;
        v
    }

    fn insert(conn: &mut Connection, content: &str, dim: usize) -> String {
        add_document(conn, content, "tester", "contribution", &embedding(dim))
            .unwrap()
            .id
    }

    #[test]
    fn returns_nearest_first() {
        let mut conn = test_db();
        let id_a = insert(&mut conn, "About Rust", 0);
        let _id_b = insert(&mut conn, "About Python", 100);
        let _id_c = insert(&mut conn, "About cooking", 200);

        let results = search_documents(&conn, &embedding(0), 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document.id, id_a);
        assert!(results[0].distance < 0.01);
        assert!(results[0].distance <= results[1].distance);
        assert!(results[1].distance <= results[2].distance);
    }

    #[test]
    fn respects_limit() {
        let mut conn = test_db();
        for i in 0..6 {
            insert(&mut conn, &format!("doc {i}"), i);
        }

        let results = search_documents(&conn, &embedding(0), 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn empty_store_yields_no_results() {
        let conn = test_db();
        let results = search_documents(&conn, &embedding(0), 3).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn zero_limit_yields_no_results() {
        let mut conn = test_db();
        insert(&mut conn, "some doc", 0);
        let results = search_documents(&conn, &embedding(0), 0).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn hydrates_full_document_fields() {
        let mut conn = test_db();
        let id = insert(&mut conn, "A contributed fact", 0);

        let results = search_documents(&conn, &embedding(0), 1).unwrap();
        assert_eq!(results.len(), 1);
        let doc = &results[0].document;
        assert_eq!(doc.id, id);
        assert_eq!(doc.content, "A contributed fact");
        assert_eq!(doc.contributor, "tester");
        assert_eq!(doc.source, "contribution");
        assert!(!doc.created_at.is_empty());
    }
}
