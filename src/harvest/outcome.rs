//! Per-URL fetch results and batch statistics

use std::collections::HashMap;
use std::time::Duration;

/// Result text recorded when the fetcher reports an unsuccessful fetch
pub const FETCH_FAILED_MESSAGE: &str = "Error: Could not fetch content.";

/// Result text recorded when a fetch attempt breaks down
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Error: An unexpected error occurred.";

/// Final result for one requested URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Extracted page text
    Content(String),

    /// The fetcher reported failure
    Failed { reason: String },

    /// The fetch attempt errored or panicked
    Errored { reason: String },
}

impl PageOutcome {
    /// Content for successful fetches, the matching sentinel otherwise
    pub fn display_text(&self) -> &str {
        match self {
            PageOutcome::Content(text) => text,
            PageOutcome::Failed { .. } => FETCH_FAILED_MESSAGE,
            PageOutcome::Errored { .. } => UNEXPECTED_ERROR_MESSAGE,
        }
    }

    /// Owned variant of [`PageOutcome::display_text`]
    pub fn into_display_text(self) -> String {
        match self {
            PageOutcome::Content(text) => text,
            other => other.display_text().to_string(),
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            PageOutcome::Content(_) => None,
            PageOutcome::Failed { reason } | PageOutcome::Errored { reason } => Some(reason),
        }
    }
}

/// Counts for one fetch batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errored: usize,
    pub elapsed: Duration,
}

impl BatchStats {
    /// Tallies a result map
    pub fn from_outcomes(outcomes: &HashMap<String, PageOutcome>, elapsed: Duration) -> Self {
        let mut stats = Self {
            total: outcomes.len(),
            elapsed,
            ..Self::default()
        };
        for outcome in outcomes.values() {
            match outcome {
                PageOutcome::Content(_) => stats.succeeded += 1,
                PageOutcome::Failed { .. } => stats.failed += 1,
                PageOutcome::Errored { .. } => stats.errored += 1,
            }
        }
        stats
    }

    /// Percentage of URLs fetched successfully
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}
