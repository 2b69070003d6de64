//! URL handling module for Site-Harvest
//!
//! This module provides URL normalization plus the small helpers discovery
//! needs: scheme detection, sitemap location and same-site checks.

mod normalize;

pub use normalize::normalize_url;

use url::Url;

/// Path of the sitemap document relative to a site root
pub const SITEMAP_PATH: &str = "/sitemap.xml";

/// Returns the byte index of `://` when `input` starts with a URL scheme
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`.
pub(crate) fn scheme_separator(input: &str) -> Option<usize> {
    let idx = input.find("://")?;
    let scheme = &input[..idx];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        Some(idx)
    } else {
        None
    }
}

/// Prefixes `https://` to a seed that was typed without a scheme
///
/// # Examples
///
/// ```
/// use site_harvest::url::ensure_scheme;
///
/// assert_eq!(ensure_scheme("example.com"), "https://example.com");
/// assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
/// ```
pub fn ensure_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if scheme_separator(trimmed).is_some() {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Builds the sitemap location for a site URL
///
/// Trailing slashes are stripped before `/sitemap.xml` is appended, so
/// `https://example.com/` and `https://example.com` map to the same document.
pub fn sitemap_location(site_url: &str) -> String {
    format!(
        "{}{}",
        ensure_scheme(site_url).trim_end_matches('/'),
        SITEMAP_PATH
    )
}

/// Returns the host of a URL with any leading `www.` label removed
fn site_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => host,
        }
    })
}

/// Checks whether two URLs belong to the same site
///
/// Hosts are compared case-insensitively and a `www.` prefix is ignored,
/// so `https://www.example.com/a` and `http://example.com/b` are same-site.
/// Explicit non-default ports must match.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (site_host(a), site_host(b)) {
        (Some(ha), Some(hb)) => ha == hb && a.port() == b.port(),
        _ => false,
    }
}
