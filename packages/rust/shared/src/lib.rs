//! Shared types, error model, and configuration for seoscribe.
//!
//! This crate is the foundation depended on by all other seoscribe crates.
//! It provides:
//! - [`SeoscribeError`] — the unified error type
//! - Domain types ([`Document`], [`DocumentId`], [`RetrievalMode`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EmbeddingConfig, EmbeddingProvider, FetchConfig, KnowledgeConfig, LlmConfig,
    LlmProvider, RewriteConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_api_key,
};
pub use error::{Result, SeoscribeError};
pub use types::{Document, DocumentId, RetrievalMode};
