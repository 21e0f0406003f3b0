//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use dragnet::config::{Config, CrawlerConfig, StorageConfig};
use dragnet::crawler::{unix_now, Coordinator};
use dragnet::index::lookup;
use dragnet::search::{open_shards, search};
use dragnet::storage::{get_text, open_store, Collection, Store};
use std::path::Path;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration that keeps full URL paths
fn create_test_config(db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 4,
            fetch_timeout_secs: 5,
            scope_limit: false,
            ..CrawlerConfig::default()
        },
        storage: StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
        ..Config::default()
    }
}

fn create_coordinator(dir: &TempDir) -> Coordinator {
    let db_path = dir.path().join("crawl.dragnet");
    let store = open_store(&db_path).expect("Failed to open store");
    Coordinator::new(create_test_config(&db_path), store).expect("Failed to build coordinator")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

const HOME_PAGE: &str = r#"<html>
<head><title>Hello</title></head>
<body>
<h1>keyword keyword2 keyword2</h1>
<a href="/about">About</a>
</body>
</html>"#;

#[tokio::test]
async fn test_full_crawl_single_page() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    assert_eq!(coordinator.enqueue_seeds(&[format!("{}/", seed)]).unwrap(), 1);

    let started = unix_now();
    let summary = coordinator.run_pass().await.expect("Pass failed");

    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.fetch_failures, 0);
    assert_eq!(summary.processed, 1);

    let store = coordinator.store().lock().unwrap();
    let about = format!("{}/about", seed);

    // Seed left the frontier, the discovered link entered it
    assert!(store.get(Collection::Frontier, seed.as_bytes()).unwrap().is_none());
    assert!(store.get(Collection::Frontier, about.as_bytes()).unwrap().is_some());

    let logged: i64 = get_text(&*store, Collection::Log, &seed)
        .unwrap()
        .expect("Seed should be logged")
        .parse()
        .unwrap();
    assert!(logged >= started && logged <= unix_now());

    assert_eq!(
        get_text(&*store, Collection::Title, &seed).unwrap().as_deref(),
        Some("Hello")
    );

    for term in ["keyword", "keyword2", "hello"] {
        assert_eq!(lookup(&*store, term).unwrap().urls(), &[seed.clone()], "{}", term);
    }
    // Anchor text is not indexed
    assert!(lookup(&*store, "about").unwrap().is_empty());
}

#[tokio::test]
async fn test_discovered_links_wait_for_next_pass() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(HOME_PAGE))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<title>About us</title><a href="/">Home</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();

    let first = coordinator.run_pass().await.unwrap();
    assert_eq!(first.scheduled, 1);

    // The seed was just crawled, so only the discovered page is due
    let second = coordinator.run_pass().await.unwrap();
    assert_eq!(second.scheduled, 1);
    assert_eq!(second.requeued, 0);
    assert_eq!(second.processed, 1);

    {
        let store = coordinator.store().lock().unwrap();
        // The link back to the seed does not reschedule it within a week
        assert_eq!(store.count(Collection::Frontier).unwrap(), 0);
        assert_eq!(store.count(Collection::Log).unwrap(), 2);
    }

    let third = coordinator.run_pass().await.unwrap();
    assert_eq!(third.scheduled, 0);

    let store = coordinator.store().lock().unwrap();
    assert_eq!(
        get_text(&*store, Collection::Title, &format!("{}/about", seed))
            .unwrap()
            .as_deref(),
        Some("About us")
    );
}

#[tokio::test]
async fn test_fetch_failure_stays_pending() {
    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    let unreachable = "http://127.0.0.1:1";
    coordinator.enqueue_seeds(&[unreachable]).unwrap();

    let summary = coordinator.run_pass().await.unwrap();

    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.processed, 0);

    let store = coordinator.store().lock().unwrap();
    assert!(store
        .get(Collection::Frontier, unreachable.as_bytes())
        .unwrap()
        .is_some());
    assert!(store.get(Collection::Log, unreachable.as_bytes()).unwrap().is_none());
}

#[tokio::test]
async fn test_error_status_is_still_crawled() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(b"<title>Not Found</title>".to_vec(), "text/html"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();

    let summary = coordinator.run_pass().await.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.processed, 1);

    let store = coordinator.store().lock().unwrap();
    assert!(store.get(Collection::Log, seed.as_bytes()).unwrap().is_some());
    assert!(store.get(Collection::Frontier, seed.as_bytes()).unwrap().is_none());
}

#[tokio::test]
async fn test_binary_response_is_logged_not_parsed() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<title>Looks like HTML</title>".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();

    let summary = coordinator.run_pass().await.unwrap();
    assert_eq!(summary.processed, 1);

    let store = coordinator.store().lock().unwrap();
    assert!(store.get(Collection::Log, seed.as_bytes()).unwrap().is_some());
    assert!(store.get(Collection::Title, seed.as_bytes()).unwrap().is_none());
    assert_eq!(store.count(Collection::Index).unwrap(), 0);
}

#[tokio::test]
async fn test_plain_text_response_is_logged_not_indexed() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"crawler keywords everywhere\nhttps://other.com/page <a href=\"/x\">x</a>".to_vec(),
            "text/plain",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();

    let summary = coordinator.run_pass().await.unwrap();
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.processed, 1);

    let store = coordinator.store().lock().unwrap();
    assert!(store.get(Collection::Log, seed.as_bytes()).unwrap().is_some());
    assert_eq!(store.count(Collection::Frontier).unwrap(), 0);
    assert_eq!(store.count(Collection::Index).unwrap(), 0);
    assert_eq!(store.count(Collection::Title).unwrap(), 0);
}

/// Serves one response that promises more body than it sends, then hangs up
async fn serve_truncated_once(listener: TcpListener) {
    let Ok((mut socket, _)) = listener.accept().await else {
        return;
    };

    let mut request = vec![0u8; 4096];
    let mut read = 0;
    while !request[..read].windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut request[read..]).await {
            Ok(0) | Err(_) => return,
            Ok(n) => read += n,
        }
    }

    let response = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/html\r\n\
                    Content-Length: 10000\r\n\
                    Connection: close\r\n\r\n\
                    <title>Cut short</title><a href=\"/next\">";
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[tokio::test]
async fn test_truncated_body_is_still_crawled() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let seed = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_truncated_once(listener));

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();

    let summary = coordinator.run_pass().await.unwrap();
    server.await.unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.fetch_failures, 0);
    assert_eq!(summary.processed, 1);

    // The unreadable body counts as empty
    let store = coordinator.store().lock().unwrap();
    assert!(store.get(Collection::Log, seed.as_bytes()).unwrap().is_some());
    assert_eq!(store.count(Collection::Frontier).unwrap(), 0);
    assert!(store.get(Collection::Title, seed.as_bytes()).unwrap().is_none());
}

#[tokio::test]
async fn test_crawl_then_search_flushed_shard() {
    let mock_server = MockServer::start().await;
    let seed = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<title>Ferris</title>
<meta name="description" content="Crabs and crawlers">
<h2>crawling the web</h2>"#,
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[seed.as_str()]).unwrap();
    coordinator.run_pass().await.unwrap();
    coordinator.shutdown().await.unwrap();

    let shards = open_shards(dir.path(), "dragnet").unwrap();
    assert_eq!(shards.len(), 1);

    let results = search(&shards, "crawling").unwrap();
    assert_eq!(results.len(), 1);
    let hit = &results.hits[0];
    assert_eq!(hit.url, seed);
    assert_eq!(hit.title, "Ferris");
    assert_eq!(hit.meta, "Crabs and crawlers");

    // "crawling" is only reached through expansion of "crawl"
    let results = search(&shards, "crawled").unwrap();
    assert!(results.expanded);
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_shutdown_before_pass_fetches_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(HOME_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&dir);
    coordinator.enqueue_seeds(&[mock_server.uri()]).unwrap();

    coordinator.shutdown_handle().shutdown();
    let passes = coordinator.run(true).await.unwrap();

    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].fetched, 0);
    let store = coordinator.store().lock().unwrap();
    assert_eq!(store.count(Collection::Frontier).unwrap(), 1);
}
