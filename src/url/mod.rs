//! URL handling module for Dragnet
//!
//! This module provides canonicalization of crawl keys, resolution of links
//! found on a page, and validation of URLs before they enter the frontier.

mod canonical;
mod resolve;

// Re-export main functions
pub use canonical::{canonicalize, Scope};
pub use resolve::{plain_text_url, resolve_link, validate_crawlable};
