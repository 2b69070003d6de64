use super::scheme_separator;
use url::Url;

/// Scheme every normalized URL carries
const CANONICAL_SCHEME: &str = "https";

/// Default port for the canonical scheme, dropped from the authority
const CANONICAL_PORT: u16 = 443;

/// Normalizes a URL string into Site-Harvest's canonical comparison form
///
/// # Normalization Steps
///
/// 1. Trim and lower-case the whole input
/// 2. Parse into scheme, authority, path, query and fragment
///    (a missing scheme is read as `https://`)
/// 3. Force the scheme to `https`
/// 4. Remove leading `www.` host labels
/// 5. Strip trailing `/` characters from the path (the root path becomes empty)
/// 6. Discard query string and fragment
/// 7. Reassemble scheme, authority and path only
/// 8. Parse the rebuilt string once more and keep the parser's reading
///
/// Any string is accepted. Input that cannot be parsed as a URL is
/// normalized by plain string surgery instead, so the result may be
/// nonsensical but is never an error. The function is pure and idempotent.
///
/// # Examples
///
/// ```
/// use site_harvest::url::normalize_url;
///
/// assert_eq!(normalize_url("https://www.Example.com/foo/"), "https://example.com/foo");
/// assert_eq!(normalize_url("http://example.com/?q=1#top"), "https://example.com");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let parsed = if scheme_separator(&lowered).is_some() {
        Url::parse(&lowered)
    } else {
        Url::parse(&format!("{}://{}", CANONICAL_SCHEME, lowered))
    };

    let candidate = match parsed {
        Ok(url) if has_host(&url) => assemble(&url),
        _ => normalize_unparsed(&lowered),
    };

    canonicalize(candidate)
}

fn has_host(url: &Url) -> bool {
    url.host_str().is_some_and(|h| !h.is_empty())
}

/// Runs a rebuilt `https://` string through the parser once more
///
/// A stripped host or a fallback string may read differently the second
/// time (`1.82` is an IPv4 address, `[::1]` parses once `www.` is gone), so
/// the parser's reading is what gets returned.
fn canonicalize(candidate: String) -> String {
    let candidate = candidate.to_lowercase();
    match Url::parse(&candidate) {
        Ok(url) if has_host(&url) => assemble(&url).to_lowercase(),
        _ => candidate,
    }
}

/// Rebuilds `https://` + authority + trimmed path from a parsed URL
fn assemble(url: &Url) -> String {
    let mut out = String::from(CANONICAL_SCHEME);
    out.push_str("://");

    let password = url.password();
    if !url.username().is_empty() || password.is_some() {
        out.push_str(url.username());
        if let Some(password) = password {
            out.push(':');
            out.push_str(password);
        }
        out.push('@');
    }

    out.push_str(strip_www(url.host_str().unwrap_or_default()));

    // The parser already dropped the default port of the input scheme
    if let Some(port) = url.port() {
        if port != CANONICAL_PORT {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    out.push_str(url.path().trim_end_matches('/'));
    out
}

/// Removes leading `www.` labels without emptying the host
///
/// Only whole `www.` labels are removed: `web.com` and `wwwx.com` are left alone.
fn strip_www(host: &str) -> &str {
    let mut host = host;
    while let Some(rest) = host.strip_prefix("www.") {
        if rest.is_empty() {
            break;
        }
        host = rest;
    }
    host
}

/// Best-effort normalization for strings the URL parser rejects
fn normalize_unparsed(lowered: &str) -> String {
    let without_scheme = match scheme_separator(lowered) {
        Some(idx) => &lowered[idx + 3..],
        None => lowered,
    };
    let without_scheme = without_scheme.trim_start_matches('/');

    let end = without_scheme
        .find(|c| c == '?' || c == '#')
        .unwrap_or(without_scheme.len());
    let body = without_scheme[..end]
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace());

    let (authority, path) = match body.find('/') {
        Some(idx) => body.split_at(idx),
        None => (body, ""),
    };

    // Only the host part loses its `www.` labels, never the userinfo
    let (userinfo, host_port) = match authority.rfind('@') {
        Some(idx) => authority.split_at(idx + 1),
        None => ("", authority),
    };

    format!(
        "{}://{}{}{}",
        CANONICAL_SCHEME,
        userinfo,
        strip_www(host_port),
        path
    )
}
