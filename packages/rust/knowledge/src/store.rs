//! The single-slot website knowledge store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use seoscribe_shared::{
    Document, DocumentId, KnowledgeConfig, Result, RetrievalMode, SeoscribeError,
};

use crate::embedder::Embedder;
use crate::index::FlatL2Index;

/// Snapshot of store occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Vectors currently indexed.
    pub vectors: usize,
    /// Texts retained for nearest-mode lookups.
    pub documents: usize,
    pub dimension: usize,
    pub has_current: bool,
}

#[derive(Debug)]
struct StoreState {
    index: FlatL2Index,
    /// Slot texts, only populated in [`RetrievalMode::Nearest`].
    texts: HashMap<DocumentId, String>,
    current: Option<Document>,
}

/// Holds the latest ingested document and the index of every embedded page.
///
/// Embedding always runs outside the lock; each ingest commits its document
/// and vector in one write-locked step, so readers never see half an ingest.
pub struct KnowledgeStore {
    embedder: Arc<dyn Embedder>,
    mode: RetrievalMode,
    state: RwLock<StoreState>,
}

impl KnowledgeStore {
    /// Create an empty store sized to the embedder's dimension.
    pub fn new(embedder: Arc<dyn Embedder>, config: &KnowledgeConfig) -> Self {
        let index = FlatL2Index::new(embedder.dimension(), config.max_vectors);
        Self {
            embedder,
            mode: config.retrieval,
            state: RwLock::new(StoreState {
                index,
                texts: HashMap::new(),
                current: None,
            }),
        }
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Embed and store `text`, making it the current document.
    ///
    /// Whitespace-only text is rejected with [`SeoscribeError::EmptyContent`];
    /// a vector of the wrong length with [`SeoscribeError::DimensionMismatch`].
    /// The store is unchanged on any error.
    #[instrument(skip_all, fields(embedder = self.embedder.name(), len = text.len()))]
    pub async fn ingest(&self, text: &str) -> Result<DocumentId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SeoscribeError::EmptyContent);
        }

        let vector = self.embedder.encode(text).await?;
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(SeoscribeError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let document = Document::new(text, vector);
        let id = document.id;

        let mut state = self.state.write().await;
        let evicted = state.index.add(id, document.vector.clone())?;
        for old in &evicted {
            state.texts.remove(old);
        }
        if self.mode == RetrievalMode::Nearest {
            state.texts.insert(id, document.text.clone());
        }
        state.current = Some(document);

        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), "evicted oldest vectors");
        }
        info!(%id, vectors = state.index.len(), "document ingested");
        Ok(id)
    }

    /// Find the knowledge relevant to `query`.
    ///
    /// `Ok(None)` when nothing was ever ingested, the query embeds to a
    /// zero-length vector, or the index has no match. An empty store answers
    /// without calling the embedder.
    #[instrument(skip_all, fields(mode = ?self.mode, len = query.len()))]
    pub async fn retrieve(&self, query: &str) -> Result<Option<String>> {
        if self.state.read().await.current.is_none() {
            debug!("nothing ingested yet");
            return Ok(None);
        }

        let vector = self.embedder.encode(query).await?;
        if vector.is_empty() {
            debug!("query produced an empty embedding");
            return Ok(None);
        }
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(SeoscribeError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let state = self.state.read().await;
        let Some(current) = state.current.as_ref() else {
            return Ok(None);
        };
        let Some(hit) = state.index.search(&vector)? else {
            return Ok(None);
        };
        debug!(id = %hit.id, distance = hit.distance, "nearest neighbor");

        Ok(match self.mode {
            RetrievalMode::Latest => Some(current.text.clone()),
            RetrievalMode::Nearest => state.texts.get(&hit.id).cloned(),
        })
    }

    /// The most recently ingested document, if any.
    pub async fn current(&self) -> Option<Document> {
        self.state.read().await.current.clone()
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            vectors: state.index.len(),
            documents: state.texts.len(),
            dimension: state.index.dimension(),
            has_current: state.current.is_some(),
        }
    }
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("embedder", &self.embedder.name())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
