//! Harvest pipeline: discovery followed by the bounded parallel fetch
//!
//! seed URL → URL set → parallel fetch → per-URL result map

mod coordinator;
mod outcome;

pub use coordinator::{fetch_all, fetch_all_outcomes, FetchCoordinator, DEFAULT_CONCURRENCY};
pub use outcome::{BatchStats, PageOutcome, FETCH_FAILED_MESSAGE, UNEXPECTED_ERROR_MESSAGE};

use crate::config::Config;
use crate::discovery::{SitemapResolver, UrlSetBuilder};
use crate::fetcher::{FetchOptions, HttpPageFetcher, PageFetcher};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Instant;

/// Everything one harvest produced
#[derive(Debug, Clone)]
pub struct HarvestReport {
    /// The seed URL as supplied
    pub seed: String,

    /// Normalized URLs scheduled for fetching
    pub urls: Vec<String>,

    /// One outcome per fetched URL
    pub outcomes: HashMap<String, PageOutcome>,

    pub stats: BatchStats,

    pub generated_at: DateTime<Utc>,
}

impl HarvestReport {
    /// URL → content-or-sentinel map
    pub fn contents(&self) -> HashMap<String, String> {
        self.outcomes
            .iter()
            .map(|(url, outcome)| (url.clone(), outcome.display_text().to_string()))
            .collect()
    }

    /// Outcomes ordered by URL
    pub fn sorted_outcomes(&self) -> Vec<(&str, &PageOutcome)> {
        let mut entries: Vec<(&str, &PageOutcome)> = self
            .outcomes
            .iter()
            .map(|(url, outcome)| (url.as_str(), outcome))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Discovers and fetches every page of a site
///
/// Never fails: discovery always yields at least the seed, and fetch
/// failures become per-URL outcomes.
pub async fn harvest_site<F>(
    seed_url: &str,
    resolver: &SitemapResolver,
    fetcher: &F,
    limit: usize,
    options: FetchOptions,
) -> HarvestReport
where
    F: PageFetcher + ?Sized,
{
    let started = Instant::now();

    let urls = UrlSetBuilder::new(resolver, fetcher)
        .with_options(options)
        .build(seed_url)
        .await;

    let outcomes = FetchCoordinator::new(fetcher, limit)
        .with_options(options)
        .fetch_outcomes(&urls)
        .await;

    let stats = BatchStats::from_outcomes(&outcomes, started.elapsed());

    HarvestReport {
        seed: seed_url.to_string(),
        urls,
        outcomes,
        stats,
        generated_at: Utc::now(),
    }
}

/// Configured harvest entry point
pub struct Harvester<F: PageFetcher = HttpPageFetcher> {
    resolver: SitemapResolver,
    fetcher: F,
    limit: usize,
    options: FetchOptions,
}

impl Harvester<HttpPageFetcher> {
    /// Creates a harvester using the HTTP page fetcher
    pub fn new(config: &Config) -> crate::Result<Self> {
        Self::with_fetcher(config, HttpPageFetcher::new(config))
    }
}

impl<F: PageFetcher> Harvester<F> {
    /// Creates a harvester around a custom fetcher
    pub fn with_fetcher(config: &Config, fetcher: F) -> crate::Result<Self> {
        Ok(Self {
            resolver: SitemapResolver::new(config)?,
            fetcher,
            limit: config.fetcher.max_concurrent_fetches as usize,
            options: FetchOptions::from(&config.browser),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Discovers the normalized URL list for a seed without fetching pages
    pub async fn discover(&self, seed_url: &str) -> Vec<String> {
        UrlSetBuilder::new(&self.resolver, &self.fetcher)
            .with_options(self.options)
            .build(seed_url)
            .await
    }

    /// Discovers and fetches every page of the site
    pub async fn harvest(&self, seed_url: &str) -> HarvestReport {
        harvest_site(
            seed_url,
            &self.resolver,
            &self.fetcher,
            self.limit,
            self.options,
        )
        .await
    }
}
