//! Website fetching for seoscribe.
//!
//! This crate provides:
//! - [`ContentFetcher`] — the seam the rewrite pipeline fetches through
//! - [`HttpFetcher`] — reqwest implementation with HTML-to-text conversion
//! - [`guard`] — SSRF checks applied before any request leaves the process

mod fetcher;
pub mod guard;

pub use fetcher::{ContentFetcher, FetchedPage, HttpFetcher};
pub use guard::validate_target;
