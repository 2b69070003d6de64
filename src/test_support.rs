//! Scripted fetcher shared by the unit tests

use crate::fetcher::{FetchOptions, FetchSession, PageFetcher, PageResponse};
use crate::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the scripted session does for one URL
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Content { text: String, links: Vec<String> },
    Fail(String),
    Error(String),
    Panic,
}

impl Script {
    pub(crate) fn content(text: &str) -> Self {
        Script::Content {
            text: text.to_string(),
            links: Vec::new(),
        }
    }

    pub(crate) fn content_with_links(text: &str, links: &[&str]) -> Self {
        Script::Content {
            text: text.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        counters.calls.fetch_add(1, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fetcher that answers from a URL → script table
///
/// URLs without a script succeed with `content of <url>`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    delay: Duration,
    fail_open: bool,
    counters: Arc<Counters>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn sessions_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn open_session(&self) -> Result<Box<dyn FetchSession>, FetchError> {
        if self.fail_open {
            return Err(FetchError::Other("browser failed to launch".to_string()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            scripts: self.scripts.clone(),
            delay: self.delay,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct ScriptedSession {
    scripts: HashMap<String, Script>,
    delay: Duration,
    counters: Arc<Counters>,
}

#[async_trait]
impl FetchSession for ScriptedSession {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<PageResponse, FetchError> {
        let _guard = InFlight::enter(&self.counters);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.scripts.get(url) {
            None => Ok(PageResponse::success(format!("content of {}", url), Vec::new())),
            Some(Script::Content { text, links }) => {
                Ok(PageResponse::success(text.clone(), links.clone()))
            }
            Some(Script::Fail(reason)) => Ok(PageResponse::failure(reason.clone())),
            Some(Script::Error(message)) => Err(FetchError::Other(message.clone())),
            Some(Script::Panic) => panic!("scripted panic for {}", url),
        }
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
