//! Core domain types shared by the knowledge store and the rewrite pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for ingested document identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Generate a new time-sortable document identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A piece of ingested website knowledge and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Identifier of the index slot that holds `vector`.
    pub id: DocumentId,
    /// Normalized (trimmed, non-empty) text.
    pub text: String,
    /// Embedding of `text`.
    pub vector: Vec<f32>,
    /// When the document was committed to the store.
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// Build a document stamped with a fresh id and the current time.
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: DocumentId::new(),
            text: text.into(),
            vector,
            ingested_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// RetrievalMode
// ---------------------------------------------------------------------------

/// Which text a successful nearest-neighbor lookup resolves to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    /// Always the most recently ingested document, whichever vector matched.
    #[default]
    Latest,
    /// The document that owns the matched vector.
    Nearest,
}
