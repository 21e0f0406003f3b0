//! Response processor
//!
//! The single consumer of the response channel. It dispatches every fetched
//! page on its declared content type, applies what was extracted to the store
//! and records the crawl attempt in the log.
//!
//! Index, title, meta and log updates are read-modify-write sequences, so
//! exactly one processor may run against a store at a time.

use crate::crawler::fetcher::FetchedPage;
use crate::crawler::parser::{parse_html, ExtractedPage};
use crate::crawler::scheduler::{unix_now, Scheduler};
use crate::index::add_keywords;
use crate::storage::{Collection, SharedStore, Store, StorageResult};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;

/// How a response body is handled, by declared content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `text/html`: parsed and indexed
    Html,
    /// Any other `text/*`: read but not indexed
    Text,
    /// `application/*` or `image/*`: body left unread
    Binary,
    /// Missing or unrecognized content type
    Unknown,
}

impl ContentKind {
    /// Classifies a `Content-Type` header value
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(value) = content_type else {
            return Self::Unknown;
        };

        let mime = value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "text/html" {
            Self::Html
        } else if mime.starts_with("text/") {
            Self::Text
        } else if mime.starts_with("application/") || mime.starts_with("image/") {
            Self::Binary
        } else {
            Self::Unknown
        }
    }
}

/// Writes what one page yielded to the store
///
/// Title and meta overwrite the previous values, keyword texts are added to
/// the index, links not crawled within the revisit interval are enqueued,
/// and finally the URL moves from the frontier to the log.
///
/// # Arguments
///
/// * `store` - The store, already locked by the caller
/// * `scheduler` - Frontier operations
/// * `url` - Canonical URL of the page
/// * `page` - Extraction result, `None` for pages that were not parsed
/// * `now` - Crawl timestamp to log
pub fn apply_page(
    store: &mut dyn Store,
    scheduler: &Scheduler,
    url: &str,
    page: Option<&ExtractedPage>,
    now: i64,
) -> StorageResult<()> {
    if let Some(page) = page {
        if let Some(title) = &page.title {
            store.set(Collection::Title, url.as_bytes(), title.as_bytes())?;
        }
        if let Some(meta) = &page.meta {
            store.set(Collection::Meta, url.as_bytes(), meta.as_bytes())?;
        }

        for text in &page.keyword_texts {
            add_keywords(store, url, text)?;
        }

        let mut enqueued = 0;
        for link in &page.links {
            if scheduler.enqueue_discovered(store, &link.url, now)? {
                enqueued += 1;
            }
        }

        tracing::debug!(
            "Processed {}: {} links ({} new)",
            url,
            page.links.len(),
            enqueued
        );
    }

    scheduler.mark_crawled(store, url, now)
}

/// Consumes fetched pages and applies them to the store
#[derive(Clone)]
pub struct Processor {
    store: SharedStore,
    scheduler: Scheduler,
}

impl Processor {
    /// Creates a new processor
    pub fn new(store: SharedStore, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    /// Processes one fetched page
    ///
    /// A body that cannot be read is treated as empty; the page is still
    /// marked crawled.
    pub async fn process(&self, fetched: FetchedPage) -> StorageResult<()> {
        let FetchedPage { url, response } = fetched;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let kind = ContentKind::from_content_type(content_type.as_deref());
        let page_url = response.url().clone();

        let page = match kind {
            ContentKind::Html | ContentKind::Text => {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!("Failed to read body of {}: {}", url, e);
                        String::new()
                    }
                };
                (kind == ContentKind::Html).then(|| parse_html(&body, &page_url))
            }
            ContentKind::Binary | ContentKind::Unknown => {
                tracing::debug!(
                    "Skipping {} ({})",
                    url,
                    content_type.as_deref().unwrap_or("no content type")
                );
                drop(response);
                None
            }
        };

        let mut store = self.store.lock()?;
        apply_page(&mut *store, &self.scheduler, &url, page.as_ref(), unix_now())
    }

    /// Runs until the response channel closes
    ///
    /// # Returns
    ///
    /// The number of pages marked crawled
    pub async fn run(self, mut responses: mpsc::Receiver<FetchedPage>) -> usize {
        let mut processed = 0;

        while let Some(fetched) = responses.recv().await {
            let url = fetched.url.clone();
            match self.process(fetched).await {
                Ok(()) => processed += 1,
                Err(e) => tracing::error!("Failed to process {}: {}", url, e),
            }
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::parser::ExtractedLink;
    use crate::index::lookup;
    use crate::storage::{get_text, SqliteStore};
    use crate::url::Scope;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_content_kind_classification() {
        use ContentKind::*;

        assert_eq!(ContentKind::from_content_type(Some("text/html")), Html);
        assert_eq!(
            ContentKind::from_content_type(Some("Text/HTML; charset=utf-8")),
            Html
        );
        assert_eq!(ContentKind::from_content_type(Some("text/plain")), Text);
        assert_eq!(ContentKind::from_content_type(Some("application/pdf")), Binary);
        assert_eq!(ContentKind::from_content_type(Some("image/png")), Binary);
        assert_eq!(ContentKind::from_content_type(Some("video/mp4")), Unknown);
        assert_eq!(ContentKind::from_content_type(None), Unknown);
    }

    fn sample_page() -> ExtractedPage {
        ExtractedPage {
            links: vec![
                ExtractedLink {
                    url: "http://a.com/about".to_string(),
                    text: Some("About".to_string()),
                },
                ExtractedLink {
                    url: "http://a.com/about#team".to_string(),
                    text: None,
                },
            ],
            title: Some("Hello".to_string()),
            meta: Some("Greetings page".to_string()),
            keyword_texts: vec!["Hello".to_string(), "Greetings page".to_string()],
        }
    }

    #[test]
    fn test_apply_page_writes_everything() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let scheduler = Scheduler::new(Scope::AllUrls);
        scheduler.enqueue(&mut store, "http://a.com").unwrap();

        apply_page(&mut store, &scheduler, "http://a.com", Some(&sample_page()), NOW).unwrap();

        assert_eq!(
            get_text(&store, Collection::Title, "http://a.com").unwrap(),
            Some("Hello".to_string())
        );
        assert_eq!(
            get_text(&store, Collection::Meta, "http://a.com").unwrap(),
            Some("Greetings page".to_string())
        );
        assert!(lookup(&store, "greetings").unwrap().contains("http://a.com"));
        assert_eq!(scheduler.scan_due(&store).unwrap(), vec!["http://a.com/about"]);
        assert_eq!(scheduler.last_crawled(&store, "http://a.com").unwrap(), Some(NOW));
    }

    #[test]
    fn test_apply_skipped_page_only_logs() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let scheduler = Scheduler::new(Scope::AllUrls);
        scheduler.enqueue(&mut store, "http://a.com/file.pdf").unwrap();

        apply_page(&mut store, &scheduler, "http://a.com/file.pdf", None, NOW).unwrap();

        assert_eq!(store.count(Collection::Frontier).unwrap(), 0);
        assert_eq!(store.count(Collection::Title).unwrap(), 0);
        assert_eq!(store.count(Collection::Log).unwrap(), 1);
    }

    #[test]
    fn test_self_link_does_not_requeue_page() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        // Every link collapses to the host under the default scope
        let scheduler = Scheduler::default();
        scheduler.enqueue(&mut store, "http://a.com").unwrap();

        apply_page(&mut store, &scheduler, "http://a.com", Some(&sample_page()), NOW).unwrap();

        assert_eq!(store.count(Collection::Frontier).unwrap(), 0);
    }

    #[test]
    fn test_link_to_recently_crawled_page_is_not_requeued() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let scheduler = Scheduler::default();
        scheduler.enqueue(&mut store, "http://a.com").unwrap();
        apply_page(&mut store, &scheduler, "http://a.com", None, NOW).unwrap();

        let page = ExtractedPage {
            links: vec![ExtractedLink {
                url: "http://a.com/".to_string(),
                text: None,
            }],
            ..ExtractedPage::default()
        };
        scheduler.enqueue(&mut store, "http://b.com").unwrap();
        apply_page(&mut store, &scheduler, "http://b.com", Some(&page), NOW + 1).unwrap();

        assert!(scheduler.scan_due(&store).unwrap().is_empty());
    }
}
