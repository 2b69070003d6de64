//! HTML parser for extracting page text and internal links
//!
//! This module turns a fetched HTML document into:
//! - Markdown text of the page (script and style content removed)
//! - Same-site link targets (from <a> tags and canonical links)

use crate::url::is_same_site;
use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};
use url::Url;

/// Tags whose content never contributes page text
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Markdown rendering of the page
    pub text: String,

    /// Same-site links found on the page (absolute URLs, document order)
    pub internal_links: Vec<String>,
}

/// Parses HTML content and extracts its text and internal links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only anchors
/// - Targets on another host (a `www.` prefix is ignored)
///
/// # Example
///
/// ```
/// use site_harvest::fetcher::parse_page;
/// use url::Url;
///
/// let html = r#"<html><body><p>Hello</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url);
/// assert!(parsed.text.contains("Hello"));
/// assert_eq!(parsed.internal_links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        text: extract_text(html, &document),
        internal_links: extract_internal_links(&document, base_url),
    }
}

/// Renders the page as markdown, falling back to its visible text
fn extract_text(html: &str, document: &Html) -> String {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    match converter.convert(html) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(e) => {
            tracing::debug!("Markdown conversion failed, using plain text: {}", e);
            visible_text(document)
        }
    }
}

/// Collects the text nodes of `<body>` outside of skipped tags
fn visible_text(document: &Html) -> String {
    let Ok(body_selector) = Selector::parse("body") else {
        return String::new();
    };

    let mut words: Vec<&str> = Vec::new();
    for body in document.select(&body_selector) {
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| SKIPPED_TAGS.contains(&el.name()))
            });
            if !hidden {
                words.extend(text.split_whitespace());
            }
        }
    }

    words.join(" ")
}

/// Extracts same-site links from the HTML document, without duplicates
fn extract_internal_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let mut push = |href: &str| {
        if let Some(absolute) = resolve_link(href, base_url) {
            if is_same_site(&absolute, base_url) {
                let absolute = absolute.to_string();
                if !links.contains(&absolute) {
                    links.push(absolute);
                }
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, special schemes, fragment-only anchors and
/// anything that fails to resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}
