use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use seoscribe_shared::{LlmConfig, Result, SeoscribeError};

use super::{ChatMessage, LanguageModel, http_client, rejection};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// Non-streaming client for Ollama's `/api/chat`.
///
/// No request timeout is set here; callers bound generation themselves.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: format!("{}/api/chat", config.resolved_base_url()),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaChat {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| SeoscribeError::Network(format!("{}: {e}", self.endpoint)))?;

        if !response.status().is_success() {
            return Err(rejection("ollama", response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SeoscribeError::Generation(format!("malformed ollama response: {e}")))?;

        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| SeoscribeError::Generation("ollama response had no message".into()))?;

        debug!(len = content.len(), "completion received");
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seoscribe_shared::LlmProvider;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> OllamaChat {
        OllamaChat::new(&LlmConfig {
            provider: LlmProvider::Ollama,
            base_url,
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn complete_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-r1",
                "stream": false,
                "messages": [{ "role": "user", "content": "rewrite this" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "deepseek-r1",
                "message": { "role": "assistant", "content": "<think>hmm</think>Done." },
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(server.uri()).complete("rewrite this").await.unwrap();
        assert_eq!(reply, "<think>hmm</think>Done.");
    }

    #[tokio::test]
    async fn http_failure_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model \"deepseek-r1\" not found"))
            .mount(&server)
            .await;

        let err = client(server.uri()).complete("x").await.unwrap_err();
        assert!(matches!(err, SeoscribeError::Generation(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn missing_message_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "done": true })),
            )
            .mount(&server)
            .await;

        let err = client(server.uri()).complete("x").await.unwrap_err();
        assert!(matches!(err, SeoscribeError::Generation(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Exclusive (non-pooled) server so dropping it actually closes the port.
        let server = MockServer::builder().start().await;
        let uri = server.uri();
        drop(server);

        let err = client(uri).complete("x").await.unwrap_err();
        assert!(matches!(err, SeoscribeError::Network(_)));
    }
}
