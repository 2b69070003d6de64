//! Internal link discovery from the seed page

use crate::fetcher::{FetchOptions, FetchOutcome, PageFetcher};
use crate::url::ensure_scheme;
use crate::FetchError;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Why the seed page yielded no links
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Could not open fetch session: {0}")]
    Session(#[source] FetchError),

    #[error("Fetching the seed page failed: {0}")]
    Fetch(#[source] FetchError),

    #[error("Seed page fetch was unsuccessful: {reason}")]
    Unsuccessful { reason: String },
}

/// Fetches the seed page and returns its internal link targets
///
/// Hrefs are trimmed and empty ones discarded. The session opened for the
/// seed page is closed on every path; a panicking fetch is re-raised only
/// after the close.
pub async fn try_discover_links<F>(
    fetcher: &F,
    seed_url: &str,
    options: &FetchOptions,
) -> Result<HashSet<String>, DiscoveryError>
where
    F: PageFetcher + ?Sized,
{
    let session = fetcher
        .open_session()
        .await
        .map_err(DiscoveryError::Session)?;

    let target = ensure_scheme(seed_url);
    let attempt = AssertUnwindSafe(session.fetch(&target, options))
        .catch_unwind()
        .await;

    if let Err(e) = session.close().await {
        tracing::debug!("Failed to close discovery session: {}", e);
    }

    let mut response = match attempt {
        Ok(response) => response.map_err(DiscoveryError::Fetch)?,
        Err(payload) => panic::resume_unwind(payload),
    };
    let internal_links = std::mem::take(&mut response.internal_links);
    if let FetchOutcome::Failure { reason } = response.into_outcome() {
        return Err(DiscoveryError::Unsuccessful { reason });
    }

    let links: HashSet<String> = internal_links
        .iter()
        .map(|href| href.trim())
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect();

    tracing::debug!("Discovered {} internal links on {}", links.len(), target);
    Ok(links)
}

/// Like [`try_discover_links`], but any failure yields the empty set
pub async fn discover_links<F>(fetcher: &F, seed_url: &str, options: &FetchOptions) -> HashSet<String>
where
    F: PageFetcher + ?Sized,
{
    match try_discover_links(fetcher, seed_url, options).await {
        Ok(links) => links,
        Err(e) => {
            tracing::error!("Error fetching internal links for {}: {}", seed_url, e);
            HashSet::new()
        }
    }
}
