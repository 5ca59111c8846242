//! Cleanup passes applied to raw `htmd` output.
//!
//! Each pass is `&str -> String` and they run in a fixed order. The goal is
//! prose that embeds well and reads well inside an LLM prompt.

use std::sync::LazyLock;

use regex::Regex;

/// Run every pass over the raw Markdown.
pub(crate) fn run_pipeline(md: &str) -> String {
    let mut result = drop_images(md);
    result = flatten_links(&result);
    result = strip_leftover_html(&result);
    result = normalize_whitespace(&result);
    result = collapse_blank_lines(&result);
    result.trim().to_string()
}

/// Remove `![alt](src)` images; alt text is rarely worth embedding.
fn drop_images(md: &str) -> String {
    static IMAGE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));

    IMAGE_RE.replace_all(md, "").into_owned()
}

/// `[text](href)` becomes `text`.
fn flatten_links(md: &str) -> String {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[([^\]]*)\]\(([^)\s]+)(?:\s+[^)]*)?\)").expect("valid regex")
    });

    LINK_RE.replace_all(md, "$1").into_owned()
}

/// Remove stray HTML tags outside fenced code blocks, keeping inner text.
fn strip_leftover_html(md: &str) -> String {
    static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"</?[a-zA-Z][a-zA-Z0-9-]*(?:\s[^<>]*)?/?>").expect("valid regex")
    });

    let mut in_code_block = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_code_block = !in_code_block;
                return line.to_string();
            }
            if in_code_block {
                line.to_string()
            } else {
                HTML_TAG_RE.replace_all(line, "").into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim trailing whitespace on every line.
fn normalize_whitespace(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Collapse runs of blank lines into a single blank line.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n").into_owned()
}
