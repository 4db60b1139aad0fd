//! Document record types for the collective memory store.

use serde::{Deserialize, Serialize};

/// A contributed document, matching the `documents` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// The contributed text.
    pub content: String,
    /// User who contributed it; `"anonymous"` when not supplied.
    pub contributor: String,
    /// How the document entered the store (e.g. `"contribution"`).
    pub source: String,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}
