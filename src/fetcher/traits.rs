//! Page fetcher boundary
//!
//! The harvest core only ever talks to a fetcher through these traits. A
//! fetcher hands out sessions; one session is opened per batch, shared by
//! every concurrent fetch in that batch, and closed once the batch ends.

use crate::config::BrowserConfig;
use crate::FetchError;
use async_trait::async_trait;

/// Options forwarded with every page request
///
/// The core never interprets these. Fetchers backed by a real browser map
/// them onto launch flags via [`FetchOptions::extra_args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub headless: bool,
    pub disable_gpu: bool,
    pub disable_dev_shm_usage: bool,
    pub no_sandbox: bool,
    pub bypass_cache: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for FetchOptions {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            disable_gpu: config.disable_gpu,
            disable_dev_shm_usage: config.disable_dev_shm_usage,
            no_sandbox: config.no_sandbox,
            bypass_cache: config.bypass_cache,
        }
    }
}

impl FetchOptions {
    /// Browser command-line flags implied by these options
    pub fn extra_args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless");
        }
        if self.disable_gpu {
            args.push("--disable-gpu");
        }
        if self.disable_dev_shm_usage {
            args.push("--disable-dev-shm-usage");
        }
        if self.no_sandbox {
            args.push("--no-sandbox");
        }
        args
    }
}

/// Reason recorded for a failed response that carries no message
pub const UNKNOWN_FAILURE: &str = "unknown error";

/// Raw response of one page fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    /// Whether the fetcher considers the fetch successful
    pub success: bool,

    /// Extracted page text (markdown)
    pub text: String,

    /// Same-site link targets discovered on the page (href strings)
    pub internal_links: Vec<String>,

    /// Failure description when `success` is false
    pub error_message: Option<String>,
}

impl PageResponse {
    /// Builds a successful response
    pub fn success(text: impl Into<String>, internal_links: Vec<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            internal_links,
            error_message: None,
        }
    }

    /// Builds an unsuccessful response carrying a reason
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            internal_links: Vec::new(),
            error_message: Some(message.into()),
        }
    }

    /// Reduces the response to its success/failure outcome
    ///
    /// A failure without a message gets a generic reason.
    pub fn into_outcome(self) -> FetchOutcome {
        if self.success {
            FetchOutcome::Success { content: self.text }
        } else {
            FetchOutcome::Failure {
                reason: self
                    .error_message
                    .unwrap_or_else(|| UNKNOWN_FAILURE.to_string()),
            }
        }
    }
}

/// Success/failure result of one page-fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { content: String },
    Failure { reason: String },
}

/// A source of fetch sessions
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Acquires a session for one batch of fetches
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, FetchError>;
}

/// One acquired fetching resource (browser, HTTP client pool, ...)
///
/// `fetch` must be safe to call concurrently through a shared reference.
#[async_trait]
pub trait FetchSession: Send + Sync {
    /// Fetches a page
    ///
    /// `Ok` with `success == false` is a reported failure; `Err` means the
    /// attempt itself broke down.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageResponse, FetchError>;

    /// Releases the session
    async fn close(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
