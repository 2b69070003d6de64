//! Site-Harvest: sitemap-aware page discovery and bounded parallel fetching
//!
//! This crate discovers the pages that make up a website (its sitemap plus
//! the internal links of the seed page), collapses duplicates through URL
//! normalization, and fetches every page's text with a fixed cap on the
//! number of requests in flight. Each URL gets exactly one result: either
//! its content or a sentinel error string.

pub mod config;
pub mod discovery;
pub mod fetcher;
pub mod harvest;
pub mod output;
pub mod url;

#[cfg(test)]
mod test_support;

use thiserror::Error;

/// Main error type for Site-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetcher error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Batch aborted: {0}")]
    BatchAborted(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while resolving a site's sitemap
///
/// These never reach the caller of [`discovery::build_url_set`]; the builder
/// turns every variant into an empty set.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Sitemap request to {url} timed out")]
    Timeout { url: String },

    #[error("Sitemap request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Sitemap at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Sitemap at {url} is not well-formed XML: {message}")]
    Xml { url: String, message: String },
}

/// Errors raised by a page fetcher or one of its sessions
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Fetch session is closed")]
    SessionClosed,

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Site-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use discovery::{build_url_set, SitemapResolver, UrlSetBuilder};
pub use fetcher::{
    FetchOptions, FetchOutcome, FetchSession, HttpPageFetcher, PageFetcher, PageResponse,
};
pub use harvest::{fetch_all, harvest_site, FetchCoordinator, HarvestReport, Harvester, PageOutcome};
pub use url::normalize_url;
