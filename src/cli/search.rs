use anyhow::Result;
use std::sync::Arc;

use crate::config::CollectiveConfig;
use crate::knowledge::search::search_documents;

/// Embed a query and print the nearest stored documents.
pub async fn search(config: &CollectiveConfig, query: &str, limit: usize) -> Result<()> {
    let conn = crate::db::open_database(config.resolved_db_path())?;

    let embedder: Arc<dyn crate::embedding::Embedder> =
        Arc::from(crate::embedding::create_embedder(&config.embedding)?);

    let query_owned = query.to_string();
    let query_embedding =
        tokio::task::spawn_blocking(move || embedder.embed(&query_owned)).await??;

    let results = search_documents(&conn, &query_embedding, limit)?;

    if results.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    println!("Found {} document(s)\n", results.len());
    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        let preview = if doc.content.len() > 120 {
            let end = doc
                .content
                .char_indices()
                .take_while(|(idx, _)| *idx < 120)
                .last()
                .map(|(idx, c)| idx + c.len_utf8())
                .unwrap_or(doc.content.len());
            format!("{}...", &doc.content[..end])
        } else {
            doc.content.clone()
        };

        println!(
            "  {}. {} (by {}, distance: {:.4})",
            i + 1,
            doc.id,
            doc.contributor,
            result.distance,
        );
        println!("     {preview}");
        println!();
    }

    Ok(())
}
