//! Error types for seoscribe.
//!
//! Library crates use [`SeoscribeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all seoscribe operations.
#[derive(Debug, thiserror::Error)]
pub enum SeoscribeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP transport error (fetcher, embedder or LLM backend).
    #[error("network error: {0}")]
    Network(String),

    /// The embedding backend failed or returned an unusable response.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// A vector did not match the index dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Attempted to ingest empty or whitespace-only text.
    #[error("refusing to ingest empty content")]
    EmptyContent,

    /// The LLM backend rejected the request or returned no usable content.
    #[error("generation error: {0}")]
    Generation(String),

    /// A suspending stage ran past its deadline.
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    /// The caller cancelled the operation.
    #[error("{stage} cancelled")]
    Cancelled { stage: &'static str },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad URL, blocked host, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SeoscribeError>;

impl SeoscribeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
