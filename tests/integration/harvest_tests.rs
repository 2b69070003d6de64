//! Integration tests for the parallel fetch coordinator and the HTTP fetcher
//!
//! These tests use wiremock for real HTTP round trips and an instrumented
//! fetcher for concurrency accounting.

use async_trait::async_trait;
use site_harvest::fetcher::{FetchOptions, FetchSession, HttpPageFetcher, PageFetcher, PageResponse};
use site_harvest::harvest::{
    fetch_all, fetch_all_outcomes, PageOutcome, FETCH_FAILED_MESSAGE, UNEXPECTED_ERROR_MESSAGE,
};
use site_harvest::FetchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher that records how many fetches overlap
#[derive(Default)]
struct CountingFetcher {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fail_for: Option<String>,
}

struct CountingSession {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    fail_for: Option<String>,
}

#[async_trait]
impl PageFetcher for CountingFetcher {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, FetchError> {
        Ok(Box::new(CountingSession {
            in_flight: Arc::clone(&self.in_flight),
            peak: Arc::clone(&self.peak),
            closed: Arc::clone(&self.closed),
            fail_for: self.fail_for.clone(),
        }))
    }
}

#[async_trait]
impl FetchSession for CountingSession {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<PageResponse, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(15)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_for.as_deref() == Some(url) {
            Ok(PageResponse::failure("render failed"))
        } else {
            Ok(PageResponse::success(format!("text of {}", url), Vec::new()))
        }
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn page_urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://example.com/p{}", i)).collect()
}

#[tokio::test]
async fn test_peak_concurrency_respects_limit() {
    for limit in [1usize, 3, 5] {
        let fetcher = CountingFetcher::default();
        let results = fetch_all(&fetcher, &page_urls(20), limit).await;

        assert_eq!(results.len(), 20);
        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= limit, "limit {} but {} in flight", limit, peak);
        assert!(peak >= 1);
        assert_eq!(fetcher.closed.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_one_failure_among_three() {
    let fetcher = CountingFetcher {
        fail_for: Some("https://example.com/p1".to_string()),
        ..CountingFetcher::default()
    };
    let results = fetch_all(&fetcher, &page_urls(3), 5).await;

    assert_eq!(results["https://example.com/p0"], "text of https://example.com/p0");
    assert_eq!(results["https://example.com/p1"], FETCH_FAILED_MESSAGE);
    assert_eq!(results["https://example.com/p2"], "text of https://example.com/p2");
}

#[tokio::test]
async fn test_one_entry_per_distinct_url() {
    let fetcher = CountingFetcher::default();
    let mut input = page_urls(4);
    input.extend(page_urls(2));
    input.push("https://example.com/p3".to_string());

    let results = fetch_all(&fetcher, &input, 2).await;
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn test_http_fetcher_against_mock_server() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head><title>OK</title><script>tracking()</script></head>
                    <body><h1>Hello</h1><p>Body text</p></body></html>"#,
                )
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("  plain notes  ")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/ok", base_url),
        format!("{}/broken", base_url),
        format!("{}/missing", base_url),
        format!("{}/notes.txt", base_url),
        "http://127.0.0.1:9/refused".to_string(),
    ];

    let fetcher = HttpPageFetcher::default().with_timeout(Duration::from_secs(5));
    let outcomes = fetch_all_outcomes(&fetcher, &urls, 3, FetchOptions::default()).await;
    assert_eq!(outcomes.len(), 5);

    match &outcomes[&urls[0]] {
        PageOutcome::Content(text) => {
            assert!(text.contains("Hello"));
            assert!(text.contains("Body text"));
            assert!(!text.contains("tracking"));
        }
        other => panic!("expected content, got {:?}", other),
    }
    assert_eq!(
        outcomes[&urls[1]],
        PageOutcome::Failed {
            reason: "HTTP 500".to_string()
        }
    );
    assert_eq!(outcomes[&urls[2]].display_text(), FETCH_FAILED_MESSAGE);
    assert_eq!(outcomes[&urls[3]], PageOutcome::Content("plain notes".to_string()));
    assert_eq!(outcomes[&urls[4]].display_text(), UNEXPECTED_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_bypass_cache_sends_no_cache_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fresh"))
        .and(header("cache-control", "no-cache"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>fresh</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::default();
    let session = fetcher.open_session().await.unwrap();
    let response = session
        .fetch(&format!("{}/fresh", server.uri()), &FetchOptions::default())
        .await
        .unwrap();
    session.close().await.unwrap();

    assert!(response.success);
    assert!(response.text.contains("fresh"));
}

#[tokio::test]
async fn test_internal_links_reported_by_http_fetcher() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body>
                    <a href="/a">A</a>
                    <a href="b">B</a>
                    <a href="https://elsewhere.example.net/">Out</a>
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::default();
    let session = fetcher.open_session().await.unwrap();
    let response = session
        .fetch(&format!("{}/", base_url), &FetchOptions::default())
        .await
        .unwrap();

    assert_eq!(
        response.internal_links,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
}
