//! Application configuration for seoscribe.
//!
//! User config lives at `~/.seoscribe/seoscribe.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeoscribeError};
use crate::types::RetrievalMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "seoscribe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".seoscribe";

/// Local Ollama endpoint used by both default backends.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

// ---------------------------------------------------------------------------
// Config structs (matching seoscribe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Page fetching.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Embedding backend.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat/completion backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge store behavior.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Output post-processing.
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

impl AppConfig {
    /// Reject values that would make the pipeline unusable.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(SeoscribeError::config("embedding.dimension must be > 0"));
        }
        if self.knowledge.max_vectors == 0 {
            return Err(SeoscribeError::config("knowledge.max_vectors must be > 0"));
        }
        if self.rewrite.summary_lines == 0 {
            return Err(SeoscribeError::config("rewrite.summary_lines must be > 0"));
        }
        if self.rewrite.reasoning_close_tag.trim().is_empty() {
            return Err(SeoscribeError::config(
                "rewrite.reasoning_close_tag must not be empty",
            ));
        }
        Ok(())
    }
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Allow localhost/private-network targets.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            allow_private_hosts: false,
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama `/api/embeddings`.
    #[default]
    Ollama,
    /// Offline feature-hashing embedder.
    Hashing,
}

/// `[embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// Base URL of the embedding server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension; must match the model's output.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: default_ollama_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.into()
}
fn default_embedding_model() -> String {
    "all-minilm".into()
}
fn default_dimension() -> usize {
    384
}

/// Which chat backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama `/api/chat`.
    #[default]
    Ollama,
    /// OpenRouter (OpenAI-compatible chat completions).
    OpenRouter,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL of the chat backend. Empty means the provider default.
    #[serde(default)]
    pub base_url: String,

    /// Model used for rewriting.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Generation timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: String::new(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// The configured base URL, or the provider's well-known endpoint.
    pub fn resolved_base_url(&self) -> String {
        if !self.base_url.is_empty() {
            return self.base_url.trim_end_matches('/').to_string();
        }
        match self.provider {
            LlmProvider::Ollama => DEFAULT_OLLAMA_URL.into(),
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1".into(),
        }
    }
}

fn default_llm_model() -> String {
    "deepseek-r1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_llm_timeout() -> u64 {
    300
}

/// `[knowledge]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// How a nearest-neighbor hit resolves to text.
    #[serde(default)]
    pub retrieval: RetrievalMode,

    /// Index capacity; oldest vectors are evicted beyond this.
    #[serde(default = "default_max_vectors")]
    pub max_vectors: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalMode::default(),
            max_vectors: default_max_vectors(),
        }
    }
}

fn default_max_vectors() -> usize {
    1024
}

/// `[rewrite]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Number of leading output lines kept in the summary.
    #[serde(default = "default_summary_lines")]
    pub summary_lines: usize,

    /// Marker that closes a model's reasoning section.
    #[serde(default = "default_reasoning_close_tag")]
    pub reasoning_close_tag: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            summary_lines: default_summary_lines(),
            reasoning_close_tag: default_reasoning_close_tag(),
        }
    }
}

fn default_summary_lines() -> usize {
    2
}
fn default_reasoning_close_tag() -> String {
    "</think>".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.seoscribe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SeoscribeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.seoscribe/seoscribe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SeoscribeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        SeoscribeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SeoscribeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SeoscribeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SeoscribeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set when the provider needs one.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    if config.llm.provider != LlmProvider::OpenRouter {
        return Ok(());
    }
    let var_name = &config.llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(SeoscribeError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("all-minilm"));
        assert!(toml_str.contains("deepseek-r1"));
        assert!(toml_str.contains(r#"retrieval = "latest""#));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.embedding.dimension, 384);
        assert_eq!(parsed.rewrite.summary_lines, 2);
        assert_eq!(parsed.rewrite.reasoning_close_tag, "</think>");
        assert_eq!(parsed.knowledge.max_vectors, 1024);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
provider = "openrouter"
model = "deepseek/deepseek-r1"

[knowledge]
retrieval = "nearest"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.provider, LlmProvider::OpenRouter);
        assert_eq!(config.llm.model, "deepseek/deepseek-r1");
        assert_eq!(config.llm.timeout_secs, 300);
        assert_eq!(config.knowledge.retrieval, RetrievalMode::Nearest);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn resolved_base_url_per_provider() {
        let mut llm = LlmConfig::default();
        assert_eq!(llm.resolved_base_url(), "http://localhost:11434");

        llm.provider = LlmProvider::OpenRouter;
        assert_eq!(llm.resolved_base_url(), "https://openrouter.ai/api/v1");

        llm.base_url = "http://proxy.internal:8080/v1/".into();
        assert_eq!(llm.resolved_base_url(), "http://proxy.internal:8080/v1");
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.embedding.dimension = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rewrite.summary_lines = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("summary_lines"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("seoscribe-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[embedding]\nprovider = \"hashing\"\ndimension = 64\n")
            .expect("write config");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.embedding.dimension, 64);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_config_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("seoscribe-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[embedding\n").expect("write config");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Ollama needs no key
        assert!(validate_api_key(&config).is_ok());

        config.llm.provider = LlmProvider::OpenRouter;
        // Use a unique env var name to avoid interfering with other tests
        config.llm.api_key_env = "SEOSCRIBE_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
