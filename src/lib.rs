//! Dragnet: a recrawling web indexer
//!
//! This crate crawls web pages from seed URLs, extracts outbound links and page
//! keywords, persists them in an embedded ordered key-value store, and serves
//! ranked keyword search over the accumulated index.

pub mod config;
pub mod crawler;
pub mod index;
pub mod output;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Dragnet operations
#[derive(Debug, Error)]
pub enum DragnetError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Dragnet operations
pub type Result<T> = std::result::Result<T, DragnetError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use storage::{Collection, SharedStore, SqliteStore, Store};
pub use self::url::{canonicalize, Scope};
