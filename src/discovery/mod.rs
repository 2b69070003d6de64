//! URL discovery for Site-Harvest
//!
//! This module builds the list of pages to fetch for a seed URL:
//! - Sitemap resolution (`/sitemap.xml`)
//! - Internal links of the seed page
//! - Union, seed fallback and normalization into a deduplicated list

mod links;
mod sitemap;

pub use links::{discover_links, try_discover_links, DiscoveryError};
pub use sitemap::{parse_sitemap, SitemapResolver, DEFAULT_SITEMAP_TIMEOUT, SITEMAP_NAMESPACE};

use crate::fetcher::{FetchOptions, PageFetcher};
use crate::url::normalize_url;
use futures::FutureExt;
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Runs a discovery step, turning a panic into `None`
async fn guarded<T, Fut>(step: &str, seed_url: &str, fut: Fut) -> Option<T>
where
    Fut: Future<Output = T>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!("Unexpected failure during {} for {}", step, seed_url);
            None
        }
    }
}

/// Builds the normalized URL set for a site
///
/// The builder owns nothing but borrowed collaborators, so it is cheap to
/// create per seed.
pub struct UrlSetBuilder<'a, F: PageFetcher + ?Sized> {
    resolver: &'a SitemapResolver,
    fetcher: &'a F,
    options: FetchOptions,
}

impl<'a, F: PageFetcher + ?Sized> UrlSetBuilder<'a, F> {
    /// Creates a builder over a sitemap resolver and a page fetcher
    pub fn new(resolver: &'a SitemapResolver, fetcher: &'a F) -> Self {
        Self {
            resolver,
            fetcher,
            options: FetchOptions::default(),
        }
    }

    /// Sets the options used when fetching the seed page
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the raw (un-normalized) union of sitemap and link URLs
    ///
    /// Falls back to `{seed_url}` when both sources come back empty.
    pub async fn collect_raw(&self, seed_url: &str) -> HashSet<String> {
        let sitemap_urls = match guarded(
            "sitemap resolution",
            seed_url,
            self.resolver.try_resolve(seed_url),
        )
        .await
        {
            Some(Ok(urls)) => urls,
            Some(Err(e)) => {
                tracing::warn!("No sitemap found or invalid format for {}: {}", seed_url, e);
                HashSet::new()
            }
            None => HashSet::new(),
        };

        let internal_links = match guarded(
            "link discovery",
            seed_url,
            try_discover_links(self.fetcher, seed_url, &self.options),
        )
        .await
        {
            Some(Ok(links)) => links,
            Some(Err(e)) => {
                tracing::error!("Error fetching internal links for {}: {}", seed_url, e);
                HashSet::new()
            }
            None => HashSet::new(),
        };

        tracing::info!(
            "Discovered {} sitemap URLs and {} internal links for {}",
            sitemap_urls.len(),
            internal_links.len(),
            seed_url
        );

        let mut union: HashSet<String> = sitemap_urls;
        union.extend(internal_links);

        if union.is_empty() {
            tracing::info!("Nothing discovered, falling back to seed {}", seed_url);
            union.insert(seed_url.to_string());
        }

        union
    }

    /// Builds the normalized, deduplicated, never-empty URL list
    ///
    /// The list is sorted so repeated runs print in a stable order.
    pub async fn build(&self, seed_url: &str) -> Vec<String> {
        match guarded("URL set construction", seed_url, self.collect_raw(seed_url)).await {
            Some(raw) => {
                let normalized: BTreeSet<String> =
                    raw.iter().map(|u| normalize_url(u)).collect();
                tracing::info!(
                    "{} unique URLs after normalization ({} raw)",
                    normalized.len(),
                    raw.len()
                );
                normalized.into_iter().collect()
            }
            None => vec![normalize_url(seed_url)],
        }
    }
}

/// Builds the normalized URL list for `seed_url`
///
/// Shorthand for [`UrlSetBuilder::build`].
pub async fn build_url_set<F>(
    seed_url: &str,
    resolver: &SitemapResolver,
    fetcher: &F,
    options: FetchOptions,
) -> Vec<String>
where
    F: PageFetcher + ?Sized,
{
    UrlSetBuilder::new(resolver, fetcher)
        .with_options(options)
        .build(seed_url)
        .await
}
