//! Single-page fetch and text extraction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::redirect::Policy;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use url::Url;

use seoscribe_markdown::convert;
use seoscribe_shared::{FetchConfig, Result, SeoscribeError};

use crate::guard::{is_internal_target, validate_target};

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("seoscribe/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Turns a URL into readable text for ingestion.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its normalized readable text.
    ///
    /// An `Ok` with empty text means the page had nothing worth keeping.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// A fetched and converted page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub title: Option<String>,
    /// Cleaned Markdown text of the main content.
    pub markdown: String,
    pub status: u16,
    /// SHA-256 of the raw response body.
    pub content_hash: String,
}

/// reqwest-backed [`ContentFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    allow_private_hosts: bool,
}

impl HttpFetcher {
    /// Build a fetcher from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect_policy(config.allow_private_hosts))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SeoscribeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Fetch a page and keep its metadata alongside the text.
    #[instrument(skip(self))]
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let target = validate_target(url, self.allow_private_hosts)?;
        debug!(%target, "fetching page");

        let response = self
            .client
            .get(target.as_str())
            .send()
            .await
            .map_err(|e| SeoscribeError::Network(format!("{target}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SeoscribeError::Network(format!("{target}: HTTP {status}")));
        }
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|e| SeoscribeError::Network(format!("{target}: body read failed: {e}")))?;

        let converted = convert(&body)?;

        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            words = converted.word_count,
            "page converted"
        );

        Ok(FetchedPage {
            url: final_url,
            title: converted.title,
            markdown: converted.markdown,
            status: status.as_u16(),
            content_hash: compute_hash(&body),
        })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let page = self.fetch_page(url).await?;
        info!(
            url = %page.url,
            title = page.title.as_deref().unwrap_or(""),
            hash = %page.content_hash,
            "page fetched"
        );
        Ok(page.markdown.trim().to_string())
    }
}

/// Follow at most [`MAX_REDIRECTS`] hops, re-running the SSRF check on each.
fn redirect_policy(allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        let verdict = check_redirect(attempt.url(), hops, allow_private_hosts);
        match verdict {
            Ok(()) => attempt.follow(),
            Err(reason) => {
                warn!(%reason, "redirect refused");
                attempt.error(reason)
            }
        }
    })
}

/// Decide whether the hop to `next` may be followed after `hops` redirects.
fn check_redirect(
    next: &Url,
    hops: usize,
    allow_private_hosts: bool,
) -> std::result::Result<(), String> {
    if hops >= MAX_REDIRECTS {
        return Err(format!("too many redirects (limit {MAX_REDIRECTS})"));
    }
    if !allow_private_hosts && is_internal_target(next) {
        return Err(format!("redirect to internal address {next}"));
    }
    Ok(())
}

/// Compute SHA-256 hash of content.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
