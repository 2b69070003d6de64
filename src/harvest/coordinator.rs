//! Parallel fetch coordinator - bounded fan-out/fan-in over one session
//!
//! A batch opens a single fetch session, schedules one task per distinct
//! URL, and lets at most `limit` of them hold an admission permit (and so
//! be fetching) at any moment. Every task records exactly one outcome;
//! a failure inside one task never touches another.

use crate::fetcher::{FetchOptions, FetchOutcome, FetchSession, PageFetcher};
use crate::harvest::outcome::{BatchStats, PageOutcome};
use crate::HarvestError;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::sync::Semaphore;

/// Default number of fetches allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Fetches batches of URLs with a fixed in-flight cap
pub struct FetchCoordinator<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    limit: usize,
    options: FetchOptions,
}

impl<'a, F: PageFetcher + ?Sized> FetchCoordinator<'a, F> {
    /// Creates a coordinator; a limit of 0 is raised to 1
    pub fn new(fetcher: &'a F, limit: usize) -> Self {
        let limit = if limit == 0 {
            tracing::warn!("Concurrency limit 0 is invalid, using 1");
            1
        } else {
            limit
        };

        Self {
            fetcher,
            limit,
            options: FetchOptions::default(),
        }
    }

    /// Sets the options forwarded with every fetch
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// The effective concurrency limit
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fetches every URL and returns content or a sentinel string per URL
    pub async fn fetch_all(&self, urls: &[String]) -> HashMap<String, String> {
        self.fetch_outcomes(urls)
            .await
            .into_iter()
            .map(|(url, outcome)| (url, outcome.into_display_text()))
            .collect()
    }

    /// Fetches every URL and returns one typed outcome per distinct URL
    ///
    /// Returns an empty map when the batch itself cannot run (the session
    /// fails to open, or the admission gate is closed).
    pub async fn fetch_outcomes(&self, urls: &[String]) -> HashMap<String, PageOutcome> {
        let started = Instant::now();

        let mut seen = HashSet::new();
        let distinct: Vec<&str> = urls
            .iter()
            .map(String::as_str)
            .filter(|url| seen.insert(*url))
            .collect();

        if distinct.is_empty() {
            return HashMap::new();
        }

        let session = match self.fetcher.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Critical error in harvest batch: {}", e);
                return HashMap::new();
            }
        };

        tracing::info!(
            "Fetching {} URLs with at most {} in flight",
            distinct.len(),
            self.limit
        );

        // Per-URL panics are caught inside fetch_one, so the batch always
        // reaches the close below
        let batch = self.run_batch(session.as_ref(), &distinct).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close fetch session: {}", e);
        }

        let outcomes = match batch {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!("Critical error in harvest batch: {}", e);
                return HashMap::new();
            }
        };

        let stats = BatchStats::from_outcomes(&outcomes, started.elapsed());
        tracing::info!(
            "Batch complete: {} succeeded, {} failed, {} errored in {:?}",
            stats.succeeded,
            stats.failed,
            stats.errored,
            stats.elapsed
        );

        outcomes
    }

    /// Fans out one task per URL behind a shared admission gate and joins them all
    async fn run_batch(
        &self,
        session: &dyn FetchSession,
        urls: &[&str],
    ) -> Result<HashMap<String, PageOutcome>, HarvestError> {
        let gate = Semaphore::new(self.limit);

        let tasks = urls
            .iter()
            .map(|url| fetch_one(session, &gate, url, &self.options));

        join_all(tasks).await.into_iter().collect()
    }
}

/// Fetches a single URL while holding an admission permit
async fn fetch_one(
    session: &dyn FetchSession,
    gate: &Semaphore,
    url: &str,
    options: &FetchOptions,
) -> Result<(String, PageOutcome), HarvestError> {
    let _permit = gate
        .acquire()
        .await
        .map_err(|e| HarvestError::BatchAborted(e.to_string()))?;

    let attempt = AssertUnwindSafe(session.fetch(url, options))
        .catch_unwind()
        .await;

    let outcome = match attempt {
        Ok(Ok(response)) => match response.into_outcome() {
            FetchOutcome::Success { content } => {
                tracing::info!("Successfully fetched: {}", url);
                PageOutcome::Content(content)
            }
            FetchOutcome::Failure { reason } => {
                tracing::warn!("Failed to fetch {} - Error: {}", url, reason);
                PageOutcome::Failed { reason }
            }
        },
        Ok(Err(e)) => {
            tracing::error!("Exception while processing {}: {}", url, e);
            PageOutcome::Errored {
                reason: e.to_string(),
            }
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!("Exception while processing {}: {}", url, reason);
            PageOutcome::Errored { reason }
        }
    };

    Ok((url.to_string(), outcome))
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during fetch".to_string()
    }
}

/// Fetches `urls` with at most `limit` in flight; see [`FetchCoordinator::fetch_all`]
pub async fn fetch_all<F>(fetcher: &F, urls: &[String], limit: usize) -> HashMap<String, String>
where
    F: PageFetcher + ?Sized,
{
    FetchCoordinator::new(fetcher, limit).fetch_all(urls).await
}

/// Typed counterpart of [`fetch_all`]
pub async fn fetch_all_outcomes<F>(
    fetcher: &F,
    urls: &[String],
    limit: usize,
    options: FetchOptions,
) -> HashMap<String, PageOutcome>
where
    F: PageFetcher + ?Sized,
{
    FetchCoordinator::new(fetcher, limit)
        .with_options(options)
        .fetch_outcomes(urls)
        .await
}
