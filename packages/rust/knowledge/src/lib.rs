//! Website knowledge: embedding backends, the vector index, and the store.
//!
//! This crate provides:
//! - [`Embedder`] — text → vector seam, with [`OllamaEmbedder`] and [`HashingEmbedder`]
//! - [`FlatL2Index`] — exact nearest-neighbor search with bounded capacity
//! - [`KnowledgeStore`] — the concurrency-safe store the rewrite pipeline reads

pub mod embedder;
pub mod index;
pub mod store;

pub use embedder::{Embedder, HashingEmbedder, OllamaEmbedder, build_embedder};
pub use index::{FlatL2Index, Neighbor};
pub use store::{KnowledgeStore, StoreStats};
