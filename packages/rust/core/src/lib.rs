//! Retrieval-augmented rewrite pipeline for seoscribe.
//!
//! Ties the fetcher, the knowledge store and a chat backend together:
//! a page is fetched and embedded, the user's text retrieves that knowledge,
//! and the model rewrites the text grounded on it.

pub mod llm;
pub mod postprocess;
pub mod prompt;
pub mod rewrite;

pub use llm::{LanguageModel, OllamaChat, OpenRouterChat, build_language_model};
pub use prompt::build_prompt;
pub use rewrite::{
    EMPTY_RESULT_MESSAGE, NO_KNOWLEDGE_MESSAGE, RewriteOptions, RewriteOutcome, RewritePhase,
    RewriteProgress, RewriteRequest, Rewriter, SilentProgress,
};
