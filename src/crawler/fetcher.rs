//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for URLs pulled from the request channel
//! - Handing responses to the processor with their originating URL
//!
//! Any HTTP status counts as a completed fetch. Only transport failures
//! (connection refused, timeout, TLS errors) are fetch failures, and those
//! leave the URL pending in the frontier for the next pass.

use crate::config::UserAgentConfig;
use crate::DragnetError;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// Shared receiving end of the request channel
pub type RequestQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// A response waiting for the processor
#[derive(Debug)]
pub struct FetchedPage {
    /// Canonical URL the request was made for
    pub url: String,

    /// The response, body not yet read
    pub response: Response,
}

/// What one fetch worker did before exiting
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub fetched: usize,
    pub failed: usize,
}

/// Formats the user agent: `Name/Version (+ContactURL; ContactEmail)`
///
/// The parenthesized part only lists the contact details that are configured.
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    let contact = match (&config.contact_url, &config.contact_email) {
        (Some(url), Some(email)) => format!(" (+{}; {})", url, email),
        (Some(url), None) => format!(" (+{})", url),
        (None, Some(email)) => format!(" ({})", email),
        (None, None) => String::new(),
    };

    format!("{}/{}{}", config.crawler_name, config.crawler_version, contact)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Limit for a whole request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use dragnet::config::UserAgentConfig;
/// use dragnet::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig::default();
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues a GET request for `url`
///
/// # Returns
///
/// * `Ok(FetchedPage)` - A response arrived, whatever its status
/// * `Err(DragnetError::Http)` - The request failed in transport
pub async fn fetch_url(client: &Client, url: &str) -> Result<FetchedPage, DragnetError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| DragnetError::Http {
            url: url.to_string(),
            source,
        })?;

    tracing::debug!("Fetched {} ({})", url, response.status());

    Ok(FetchedPage {
        url: url.to_string(),
        response,
    })
}

/// Runs one fetch worker until the request channel closes or shutdown is signalled
///
/// Failed fetches are logged and dropped; the URL stays in the frontier.
///
/// # Arguments
///
/// * `id` - Worker number, for logging
/// * `client` - Shared HTTP client
/// * `requests` - Canonical URLs to fetch
/// * `responses` - Where fetched pages are sent for processing
/// * `shutdown` - Becomes `true` when the crawl should stop
pub async fn fetch_worker(
    id: usize,
    client: Client,
    requests: RequestQueue,
    responses: mpsc::Sender<FetchedPage>,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerSummary {
    let mut summary = WorkerSummary::default();

    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = {
            let mut queue = requests.lock().await;
            tokio::select! {
                url = queue.recv() => url,
                _ = shutdown.changed() => None,
            }
        };

        let Some(url) = next else {
            break;
        };

        match fetch_url(&client, &url).await {
            Ok(page) => {
                summary.fetched += 1;
                if responses.send(page).await.is_err() {
                    tracing::warn!("Worker {}: processor has stopped", id);
                    break;
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("Worker {}: {}", id, e);
            }
        }
    }

    tracing::trace!(
        "Worker {} exiting after {} fetches ({} failed)",
        id,
        summary.fetched,
        summary.failed
    );

    summary
}
