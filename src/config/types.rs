use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Dragnet
///
/// Every section is optional in the file; missing sections and keys take
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Capacity of the request and response channels
    pub channel_capacity: usize,

    /// Limit for one fetch, body included (seconds)
    pub fetch_timeout_secs: u64,

    /// Time between store checkpoints during a pass (seconds)
    pub checkpoint_interval_secs: u64,

    /// Sleep between passes when crawling forever (seconds)
    pub pass_interval_secs: u64,

    /// Reduce every canonical URL to `scheme://host`
    pub scope_limit: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            channel_capacity: 100,
            fetch_timeout_secs: 30,
            checkpoint_interval_secs: 10,
            pass_interval_secs: 60,
            scope_limit: true,
        }
    }
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    pub fn pass_interval(&self) -> Duration {
        Duration::from_secs(self.pass_interval_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "dragnet".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the crawler's store file
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "./crawl.dragnet".to_string(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Directory scanned for shard files
    pub shard_directory: String,

    /// File extension identifying shard files, without the dot
    pub shard_extension: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            shard_directory: ".".to_string(),
            shard_extension: "dragnet".to_string(),
        }
    }
}
