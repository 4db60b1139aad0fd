use anyhow::Result;

use crate::config::CollectiveConfig;

/// Display collective memory statistics in the terminal.
pub fn stats(config: &CollectiveConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::knowledge::stats::knowledge_stats(&conn, Some(&db_path))?;

    println!("Collective Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total documents:     {}", response.total_documents);
    println!("  Contributors:        {}", response.contributors);
    println!();

    if !response.by_source.is_empty() {
        println!("By Source:");
        let mut sources: Vec<_> = response.by_source.iter().collect();
        sources.sort_by_key(|(source, _)| source.as_str());
        for (source, count) in sources {
            println!("  {:<14} {}", source, count);
        }
        println!();
    }

    println!("Database size:         {} bytes", response.db_size_bytes);

    if let Some(ref oldest) = response.oldest_document {
        println!("Oldest document:       {oldest}");
    }
    if let Some(ref newest) = response.newest_document {
        println!("Newest document:       {newest}");
    }

    Ok(())
}
