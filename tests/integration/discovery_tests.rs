//! Integration tests for sitemap resolution and URL set building
//!
//! These tests use wiremock to serve sitemaps and seed pages.

use async_trait::async_trait;
use site_harvest::config::Config;
use site_harvest::discovery::{build_url_set, try_discover_links, SitemapResolver};
use site_harvest::fetcher::{FetchOptions, FetchSession, HttpPageFetcher, PageFetcher, PageResponse};
use site_harvest::{normalize_url, FetchError, SitemapError};
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher that reports a fixed set of internal links for every page
struct FixedLinks(Vec<String>);

struct FixedLinksSession(Vec<String>);

#[async_trait]
impl PageFetcher for FixedLinks {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, FetchError> {
        Ok(Box::new(FixedLinksSession(self.0.clone())))
    }
}

#[async_trait]
impl FetchSession for FixedLinksSession {
    async fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<PageResponse, FetchError> {
        Ok(PageResponse::success("seed", self.0.clone()))
    }
}

fn resolver(timeout: Duration) -> SitemapResolver {
    SitemapResolver::with_client(reqwest::Client::new(), timeout)
}

async fn mount_sitemap(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sitemap_404_yields_empty_set() {
    let server = MockServer::start().await;
    mount_sitemap(&server, ResponseTemplate::new(404)).await;

    let resolver = resolver(Duration::from_secs(5));
    let err = resolver.try_resolve(&server.uri()).await.unwrap_err();
    assert!(matches!(err, SitemapError::Status { status: 404, .. }));

    assert!(resolver.resolve(&server.uri()).await.is_empty());
}

#[tokio::test]
async fn test_sitemap_timeout_yields_empty_set() {
    let server = MockServer::start().await;
    mount_sitemap(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("<urlset><url><loc>https://example.com/a</loc></url></urlset>")
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let resolver = resolver(Duration::from_millis(200));
    let err = resolver.try_resolve(&server.uri()).await.unwrap_err();
    assert!(matches!(err, SitemapError::Timeout { .. }), "got {:?}", err);

    assert!(resolver.resolve(&server.uri()).await.is_empty());
}

#[tokio::test]
async fn test_malformed_sitemap_yields_empty_set() {
    let server = MockServer::start().await;
    mount_sitemap(
        &server,
        ResponseTemplate::new(200).set_body_string("<html><body>Not a sitemap"),
    )
    .await;

    let resolver = resolver(Duration::from_secs(5));
    let err = resolver.try_resolve(&server.uri()).await.unwrap_err();
    assert!(matches!(err, SitemapError::Xml { .. }), "got {:?}", err);

    assert!(resolver.resolve(&server.uri()).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_host_yields_empty_set() {
    let resolver = resolver(Duration::from_secs(2));
    assert!(resolver.resolve("http://127.0.0.1:9").await.is_empty());
}

#[tokio::test]
async fn test_sitemap_is_requested_without_double_slash() {
    let server = MockServer::start().await;
    mount_sitemap(
        &server,
        ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>https://example.com/one</loc></url>
              <url><loc>https://example.com/two</loc></url>
            </urlset>"#,
        ),
    )
    .await;

    let resolver = resolver(Duration::from_secs(5));
    let urls = resolver
        .try_resolve(&format!("{}/", server.uri()))
        .await
        .unwrap();

    let expected: HashSet<String> = ["https://example.com/one", "https://example.com/two"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn test_union_of_sitemap_and_links_without_seed() {
    let server = MockServer::start().await;
    mount_sitemap(
        &server,
        ResponseTemplate::new(200)
            .set_body_string("<urlset><url><loc>https://example.com/a</loc></url></urlset>"),
    )
    .await;

    let fetcher = FixedLinks(vec!["https://example.com/b".to_string()]);
    let urls = build_url_set(
        &server.uri(),
        &resolver(Duration::from_secs(5)),
        &fetcher,
        FetchOptions::default(),
    )
    .await;

    assert_eq!(
        urls,
        vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string()
        ]
    );
}

#[tokio::test]
async fn test_seed_fallback_when_site_has_nothing() {
    let server = MockServer::start().await;
    mount_sitemap(&server, ResponseTemplate::new(404)).await;

    let fetcher = FixedLinks(Vec::new());
    let urls = build_url_set(
        &server.uri(),
        &resolver(Duration::from_secs(5)),
        &fetcher,
        FetchOptions::default(),
    )
    .await;

    assert_eq!(urls, vec![normalize_url(&server.uri())]);
}

#[tokio::test]
async fn test_discovery_with_http_fetcher() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_sitemap(
        &server,
        ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{}/page3/</loc></url><url><loc>{}/page1</loc></url></urlset>",
            base_url, base_url
        )),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><head><title>Home</title></head><body>
                    <a href="{}/page1">Page 1</a>
                    <a href="/page2?ref=nav#top">Page 2</a>
                    <a href="https://other.example.org/x">Elsewhere</a>
                    </body></html>"#,
                    base_url
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let config = Config::default();
    let fetcher = HttpPageFetcher::new(&config);
    let urls = build_url_set(
        &base_url,
        &resolver(Duration::from_secs(5)),
        &fetcher,
        FetchOptions::default(),
    )
    .await;

    let expected: Vec<String> = ["/page1", "/page2", "/page3"]
        .iter()
        .map(|p| normalize_url(&format!("{}{}", base_url, p)))
        .collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn test_link_discovery_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = HttpPageFetcher::default();
    let result = try_discover_links(&fetcher, &server.uri(), &FetchOptions::default()).await;
    assert!(result.is_err());
}
