//! Page fetching for Site-Harvest
//!
//! This module contains the fetcher boundary and its default implementation:
//! - The `PageFetcher` / `FetchSession` traits consumed by the harvest core
//! - An HTTP fetcher built on reqwest
//! - HTML parsing into markdown text and internal links

mod http;
mod parser;
mod traits;

pub use http::{build_http_client, HttpPageFetcher};
pub use parser::{parse_page, ParsedPage};
pub use traits::{
    FetchOptions, FetchOutcome, FetchSession, PageFetcher, PageResponse, UNKNOWN_FAILURE,
};
