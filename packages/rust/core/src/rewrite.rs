//! The fetch → ingest → retrieve → generate rewrite pipeline.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use seoscribe_crawler::{ContentFetcher, HttpFetcher};
use seoscribe_knowledge::{KnowledgeStore, build_embedder};
use seoscribe_shared::{AppConfig, Result, SeoscribeError};

use crate::llm::{LanguageModel, build_language_model};
use crate::postprocess;
use crate::prompt::build_prompt;

/// Shown when retrieval finds nothing to ground the rewrite on.
pub const NO_KNOWLEDGE_MESSAGE: &str = "No relevant website knowledge found.";

/// Shown when the model produced no usable text.
pub const EMPTY_RESULT_MESSAGE: &str = "Failed to generate optimized content.";

/// Tunables for [`Rewriter`].
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    pub fetch_timeout: Duration,
    pub generation_timeout: Duration,
    /// Lines of model output kept in the summary.
    pub summary_lines: usize,
    /// Marker closing the model's reasoning section.
    pub reasoning_close_tag: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RewriteOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.fetch.timeout_secs),
            generation_timeout: Duration::from_secs(config.llm.timeout_secs),
            summary_lines: config.rewrite.summary_lines,
            reasoning_close_tag: config.rewrite.reasoning_close_tag.clone(),
        }
    }
}

/// One rewrite call.
#[derive(Debug, Clone, Default)]
pub struct RewriteRequest {
    /// Page to learn from. Blank means "use what is already stored".
    pub url: String,
    /// Text to rewrite; also the retrieval query.
    pub input_text: String,
    /// Keyword to optimize for. Defaults to `input_text`.
    pub keyword: Option<String>,
}

impl RewriteRequest {
    pub fn new(url: impl Into<String>, input_text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            input_text: input_text.into(),
            keyword: None,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    fn effective_keyword(&self) -> &str {
        self.keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(&self.input_text)
    }
}

/// How a rewrite ended, when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The trimmed summary of the model's answer.
    Success(String),
    /// Nothing was retrieved; the model was not called.
    NoKnowledge,
    /// The model failed or answered with nothing usable.
    EmptyResult,
}

impl RewriteOutcome {
    /// The text a front end shows for this outcome.
    pub fn message(&self) -> &str {
        match self {
            Self::Success(summary) => summary,
            Self::NoKnowledge => NO_KNOWLEDGE_MESSAGE,
            Self::EmptyResult => EMPTY_RESULT_MESSAGE,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl std::fmt::Display for RewriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RewritePhase {
    Fetching = 0,
    Ingesting = 1,
    Retrieving = 2,
    Generating = 3,
}

impl RewritePhase {
    const ALL: [Self; 4] = [
        Self::Fetching,
        Self::Ingesting,
        Self::Retrieving,
        Self::Generating,
    ];

    /// Human-readable label for progress output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Fetching => "Fetching page",
            Self::Ingesting => "Embedding website knowledge",
            Self::Retrieving => "Retrieving knowledge",
            Self::Generating => "Generating rewrite",
        }
    }

    /// Short stage name used in errors.
    pub fn stage(self) -> &'static str {
        match self {
            Self::Fetching => "fetch",
            Self::Ingesting => "ingest",
            Self::Retrieving => "retrieve",
            Self::Generating => "generate",
        }
    }
}

/// Progress callback for rewrite calls.
pub trait RewriteProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, phase: RewritePhase);
    /// Called once the call reaches a terminal outcome.
    fn done(&self, outcome: &RewriteOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl RewriteProgress for SilentProgress {
    fn phase(&self, _phase: RewritePhase) {}
    fn done(&self, _outcome: &RewriteOutcome) {}
}

/// Remembers the last phase so a cancellation can name it.
struct PhaseTracker<'a> {
    inner: &'a dyn RewriteProgress,
    last: AtomicU8,
}

impl PhaseTracker<'_> {
    fn last(&self) -> RewritePhase {
        let idx = usize::from(self.last.load(Ordering::Acquire));
        RewritePhase::ALL
            .get(idx)
            .copied()
            .unwrap_or(RewritePhase::Fetching)
    }
}

impl RewriteProgress for PhaseTracker<'_> {
    fn phase(&self, phase: RewritePhase) {
        self.last.store(phase as u8, Ordering::Release);
        self.inner.phase(phase);
    }

    fn done(&self, outcome: &RewriteOutcome) {
        self.inner.done(outcome);
    }
}

/// Grounds rewrites of user text on knowledge fetched from a website.
pub struct Rewriter {
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<KnowledgeStore>,
    llm: Arc<dyn LanguageModel>,
    options: RewriteOptions,
}

impl Rewriter {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<KnowledgeStore>,
        llm: Arc<dyn LanguageModel>,
        options: RewriteOptions,
    ) -> Self {
        Self {
            fetcher,
            store,
            llm,
            options,
        }
    }

    /// Wire up the HTTP fetcher, embedder, store and chat backend from config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        let embedder = build_embedder(&config.embedding)?;
        let store = Arc::new(KnowledgeStore::new(embedder, &config.knowledge));
        let llm = build_language_model(&config.llm)?;
        Ok(Self::new(fetcher, store, llm, RewriteOptions::from(config)))
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Run one rewrite without progress reporting.
    pub async fn rewrite(&self, request: &RewriteRequest) -> Result<RewriteOutcome> {
        self.rewrite_with_progress(request, &SilentProgress).await
    }

    /// Run one rewrite, stopping early if `cancel` resolves first.
    ///
    /// Cancellation yields [`SeoscribeError::Cancelled`] naming the phase that
    /// was running. The store only changes if the ingest commit had finished.
    pub async fn rewrite_until<F>(
        &self,
        request: &RewriteRequest,
        progress: &dyn RewriteProgress,
        cancel: F,
    ) -> Result<RewriteOutcome>
    where
        F: Future<Output = ()>,
    {
        let tracker = PhaseTracker {
            inner: progress,
            last: AtomicU8::new(RewritePhase::Fetching as u8),
        };

        tokio::select! {
            biased;
            () = cancel => {
                let stage = tracker.last().stage();
                warn!(stage, "rewrite cancelled");
                Err(SeoscribeError::Cancelled { stage })
            }
            result = self.rewrite_with_progress(request, &tracker) => result,
        }
    }

    /// Run one rewrite, reporting each phase to `progress`.
    #[instrument(skip_all, fields(url = %request.url, input_len = request.input_text.len()))]
    pub async fn rewrite_with_progress(
        &self,
        request: &RewriteRequest,
        progress: &dyn RewriteProgress,
    ) -> Result<RewriteOutcome> {
        let url = request.url.trim();
        if url.is_empty() {
            debug!("no URL given, using stored knowledge");
        } else {
            self.learn_from(url, progress).await?;
        }

        progress.phase(RewritePhase::Retrieving);
        let Some(knowledge) = self.store.retrieve(&request.input_text).await? else {
            info!("no knowledge available");
            let outcome = RewriteOutcome::NoKnowledge;
            progress.done(&outcome);
            return Ok(outcome);
        };

        let prompt = build_prompt(&request.input_text, request.effective_keyword(), &knowledge);

        progress.phase(RewritePhase::Generating);
        let outcome = match self.generate(&prompt).await? {
            Some(raw) => {
                let summary = postprocess::summarize(
                    &raw,
                    &self.options.reasoning_close_tag,
                    self.options.summary_lines,
                );
                if summary.is_empty() {
                    RewriteOutcome::EmptyResult
                } else {
                    RewriteOutcome::Success(summary)
                }
            }
            None => RewriteOutcome::EmptyResult,
        };

        info!(success = outcome.is_success(), model = self.llm.model(), "rewrite finished");
        progress.done(&outcome);
        Ok(outcome)
    }

    /// Fetch and ingest `url`. Fetch problems are logged and skipped;
    /// embedding problems propagate.
    async fn learn_from(&self, url: &str, progress: &dyn RewriteProgress) -> Result<()> {
        progress.phase(RewritePhase::Fetching);
        let secs = self.options.fetch_timeout.as_secs();

        let text = match timeout(self.options.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(url, error = %e, "fetch failed, skipping ingestion");
                return Ok(());
            }
            Err(_) => {
                warn!(url, secs, "fetch timed out, skipping ingestion");
                return Ok(());
            }
        };

        if text.trim().is_empty() {
            warn!(url, "page had no readable text, skipping ingestion");
            return Ok(());
        }

        progress.phase(RewritePhase::Ingesting);
        self.store.ingest(&text).await?;
        Ok(())
    }

    /// `None` when the backend rejected the request.
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let limit = self.options.generation_timeout;
        match timeout(limit, self.llm.complete(prompt)).await {
            Ok(Ok(raw)) => Ok(Some(raw)),
            Ok(Err(SeoscribeError::Generation(reason))) => {
                warn!(%reason, "generation failed");
                Ok(None)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SeoscribeError::Timeout {
                stage: RewritePhase::Generating.stage(),
                secs: limit.as_secs(),
            }),
        }
    }
}

impl std::fmt::Debug for Rewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rewriter")
            .field("store", &self.store)
            .field("model", &self.llm.model())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
