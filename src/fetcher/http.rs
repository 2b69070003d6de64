//! HTTP page fetcher
//!
//! This module provides the default [`PageFetcher`]: plain HTTP GETs via
//! reqwest, with the HTML turned into markdown and internal links by
//! [`parse_page`]. It does not execute JavaScript, so rendering options are
//! only logged; `bypass_cache` is honoured through request headers.

use crate::config::{Config, UserAgentConfig};
use crate::fetcher::parser::parse_page;
use crate::fetcher::traits::{FetchOptions, FetchSession, PageFetcher, PageResponse};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::{redirect::Policy, Client};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Maximum redirect hops followed for one page
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with the crawler's identity and timeouts
///
/// # Example
///
/// ```no_run
/// use site_harvest::config::UserAgentConfig;
/// use site_harvest::fetcher::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(
///     &UserAgentConfig::default(),
///     Duration::from_secs(30),
///     Duration::from_secs(10),
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    user_agent: UserAgentConfig,
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpPageFetcher {
    /// Creates a fetcher from the harvest configuration
    pub fn new(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.fetcher.page_timeout_secs),
            connect_timeout: Duration::from_secs(config.fetcher.connect_timeout_secs),
        }
    }

    /// Overrides the per-page timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, FetchError> {
        let client = build_http_client(&self.user_agent, self.timeout, self.connect_timeout)
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;
        tracing::debug!("Opened HTTP fetch session");
        Ok(Box::new(HttpSession {
            client,
            closed: AtomicBool::new(false),
        }))
    }
}

/// A batch-scoped HTTP session
struct HttpSession {
    client: Client,
    closed: AtomicBool,
}

#[async_trait]
impl FetchSession for HttpSession {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageResponse, FetchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(FetchError::SessionClosed);
        }

        tracing::debug!("GET {} (options: {:?})", url, options.extra_args());

        let mut request = self.client.get(url);
        if options.bypass_cache {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = request.send().await.map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(PageResponse::failure(format!("HTTP {}", status.as_u16())));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        if content_type.is_empty() || content_type.contains("html") {
            let parsed = parse_page(&body, &final_url);
            Ok(PageResponse::success(parsed.text, parsed.internal_links))
        } else if content_type.starts_with("text/") {
            Ok(PageResponse::success(body.trim(), Vec::new()))
        } else {
            Ok(PageResponse::failure(format!(
                "Unsupported content type: {}",
                content_type
            )))
        }
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.closed.store(true, Ordering::Release);
        tracing::debug!("Closed HTTP fetch session");
        Ok(())
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_builder() {
        FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else if e.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
