//! Chat backends used for the rewrite step.
//!
//! Transport failures map to [`SeoscribeError::Network`]. A backend that
//! answers but refuses or returns nothing usable maps to
//! [`SeoscribeError::Generation`].

mod ollama;
mod openrouter;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use seoscribe_shared::{LlmConfig, LlmProvider, Result, SeoscribeError};

pub use ollama::OllamaChat;
pub use openrouter::OpenRouterChat;

/// Prompt in, completion text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// Build the chat backend selected by the `[llm]` config section.
pub fn build_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    Ok(match config.provider {
        LlmProvider::Ollama => Arc::new(OllamaChat::new(config)?),
        LlmProvider::OpenRouter => Arc::new(OpenRouterChat::new(config)?),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| SeoscribeError::Network(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-success response into a generation error carrying the body.
async fn rejection(backend: &str, response: reqwest::Response) -> SeoscribeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SeoscribeError::Generation(format!("{backend} returned HTTP {status}: {}", body.trim()))
}
