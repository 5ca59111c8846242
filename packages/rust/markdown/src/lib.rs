//! Page-to-text conversion for website knowledge.
//!
//! Extracts the readable part of an HTML page, converts it to Markdown with
//! `htmd`, then runs a cleanup pipeline that leaves plain, embeddable prose.

mod cleanup;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use seoscribe_shared::{Result, SeoscribeError};

/// Tags whose content never carries page knowledge.
const SKIP_TAGS: [&str; 10] = [
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript", "svg", "form",
];

/// Result of converting an HTML page.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Cleaned Markdown text, trimmed.
    pub markdown: String,
    /// `<title>`, else the first H1, else `None`.
    pub title: Option<String>,
    /// Whitespace-separated word count of `markdown`.
    pub word_count: usize,
}

/// Convert an HTML page into cleaned Markdown text.
///
/// Links are flattened to their text and images dropped.
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn convert(html: &str) -> Result<ConvertResult> {
    let doc = Html::parse_document(html);
    let content_html = extract_content_html(&doc).unwrap_or_else(|| html.to_string());

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let raw = converter
        .convert(&content_html)
        .map_err(|e| SeoscribeError::Conversion(format!("htmd conversion failed: {e}")))?;
    debug!(raw_len = raw.len(), "htmd conversion complete");

    let markdown = cleanup::run_pipeline(&raw);

    let title = extract_document_title(&doc).or_else(|| extract_title_from_markdown(&markdown));
    let word_count = markdown.split_whitespace().count();

    debug!(word_count, final_len = markdown.len(), "conversion complete");

    Ok(ConvertResult {
        markdown,
        title,
        word_count,
    })
}

/// Find the main content container, falling back to `<body>`.
fn extract_content_html(doc: &Html) -> Option<String> {
    static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        ["main", "article", "[role=\"main\"]", "#content", ".content", "body"]
            .iter()
            .map(|s| Selector::parse(s).expect("valid selector"))
            .collect()
    });

    CONTENT_SELECTORS
        .iter()
        .find_map(|sel| doc.select(sel).next())
        .map(|el| el.inner_html())
}

fn extract_document_title(doc: &Html) -> Option<String> {
    static TITLE_SEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("head > title").expect("valid selector"));

    doc.select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn extract_title_from_markdown(md: &str) -> Option<String> {
    md.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
