use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use seoscribe_shared::{LlmConfig, Result, SeoscribeError};

use super::{ChatMessage, LanguageModel, http_client, rejection};

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for OpenRouter's OpenAI-compatible `/chat/completions`.
pub struct OpenRouterChat {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenRouterChat {
    /// Build from config, reading the key from the env var named by `api_key_env`.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                SeoscribeError::config(format!(
                    "OpenRouter API key not found. Set the {} environment variable.",
                    config.api_key_env
                ))
            })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: format!("{}/chat/completions", config.resolved_base_url()),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

impl std::fmt::Debug for OpenRouterChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterChat")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LanguageModel for OpenRouterChat {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "seoscribe")
            .json(&request)
            .send()
            .await
            .map_err(|e| SeoscribeError::Network(format!("{}: {e}", self.endpoint)))?;

        if !response.status().is_success() {
            return Err(rejection("openrouter", response).await);
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            SeoscribeError::Generation(format!("malformed openrouter response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SeoscribeError::Generation("openrouter returned no choices".into()))?;

        debug!(len = content.len(), "completion received");
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
