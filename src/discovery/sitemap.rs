//! Sitemap resolution
//!
//! Fetches `<site>/sitemap.xml` and collects the text of its `<loc>`
//! elements. Elements in the standard sitemap namespace win; only when there
//! are none are un-namespaced `<loc>` elements used.

use crate::config::Config;
use crate::fetcher::build_http_client;
use crate::url::sitemap_location;
use crate::{FetchError, SitemapError};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

/// Standard sitemap XML namespace
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Default timeout for the sitemap request
pub const DEFAULT_SITEMAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Which flavour of `<loc>` element is currently open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocKind {
    Qualified,
    Unqualified,
}

/// Parses a sitemap document into the set of its `<loc>` values
///
/// Values are trimmed and empty ones dropped. Returns an error message when
/// the document is not well-formed XML.
///
/// # Example
///
/// ```
/// use site_harvest::discovery::parse_sitemap;
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc> https://example.com/a </loc></url>
/// </urlset>"#;
/// let urls = parse_sitemap(xml).unwrap();
/// assert!(urls.contains("https://example.com/a"));
/// ```
pub fn parse_sitemap(xml: &str) -> Result<HashSet<String>, String> {
    let mut reader = NsReader::from_str(xml);
    let sitemap_ns = Namespace(SITEMAP_NAMESPACE.as_bytes());

    let mut qualified = HashSet::new();
    let mut unqualified = HashSet::new();
    let mut current: Option<(LocKind, String)> = None;
    let mut depth: usize = 0;
    let mut seen_root = false;

    loop {
        let (resolved, event) = match reader.read_resolved_event() {
            Ok(pair) => pair,
            Err(e) => return Err(e.to_string()),
        };

        match event {
            Event::Start(e) => {
                if depth == 0 && seen_root {
                    return Err("multiple root elements".to_string());
                }
                depth += 1;
                seen_root = true;
                if e.local_name().as_ref() == b"loc" {
                    current = loc_kind(&resolved, sitemap_ns).map(|kind| (kind, String::new()));
                }
            }
            Event::Empty(_) => {
                if depth == 0 {
                    if seen_root {
                        return Err("multiple root elements".to_string());
                    }
                    seen_root = true;
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"loc" {
                    if let Some((kind, text)) = current.take() {
                        let value = text.trim();
                        if !value.is_empty() {
                            match kind {
                                LocKind::Qualified => qualified.insert(value.to_string()),
                                LocKind::Unqualified => unqualified.insert(value.to_string()),
                            };
                        }
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if depth == 0 && !text.trim().is_empty() {
                    return Err("text outside of the root element".to_string());
                }
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err("document has no root element".to_string());
    }
    if depth != 0 {
        return Err("unexpected end of document".to_string());
    }

    Ok(if qualified.is_empty() {
        unqualified
    } else {
        qualified
    })
}

/// Classifies a `<loc>` start tag by its resolved namespace
fn loc_kind(resolved: &ResolveResult, sitemap_ns: Namespace) -> Option<LocKind> {
    match resolved {
        ResolveResult::Bound(ns) if *ns == sitemap_ns => Some(LocKind::Qualified),
        ResolveResult::Unbound => Some(LocKind::Unqualified),
        _ => None,
    }
}

/// Resolves a site's sitemap into a set of URLs
#[derive(Debug, Clone)]
pub struct SitemapResolver {
    client: Client,
    timeout: Duration,
}

impl SitemapResolver {
    /// Creates a resolver using the configured identity and sitemap timeout
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.sitemap.timeout_secs);
        let client = build_http_client(&config.user_agent, timeout, timeout)
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// Creates a resolver around an existing client
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches and parses the sitemap, reporting why it is unusable
    pub async fn try_resolve(&self, site_url: &str) -> Result<HashSet<String>, SitemapError> {
        let url = sitemap_location(site_url);
        tracing::debug!("Fetching sitemap {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| transport_error(&url, e))?;
        let text = String::from_utf8_lossy(&body);

        let urls = parse_sitemap(&text).map_err(|message| SitemapError::Xml {
            url: url.clone(),
            message,
        })?;

        tracing::info!("Sitemap {} listed {} URLs", url, urls.len());
        Ok(urls)
    }

    /// Fetches and parses the sitemap; any failure yields the empty set
    pub async fn resolve(&self, site_url: &str) -> HashSet<String> {
        match self.try_resolve(site_url).await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!("No sitemap found or invalid format for {}: {}", site_url, e);
                HashSet::new()
            }
        }
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> SitemapError {
    if e.is_timeout() {
        SitemapError::Timeout {
            url: url.to_string(),
        }
    } else {
        SitemapError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}
