use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Counters for one feed, returned by its walker when the feed is exhausted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub source: String,
    pub pages: usize,
    pub errors: usize,
    /// Last `X-Total-Count` hint the feed reported.
    pub total_count: Option<u64>,
}

impl FeedStats {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }
}

/// Per-feed counters for a whole run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub feeds: Vec<FeedStats>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunStats {
    pub fn total_pages(&self) -> usize {
        self.feeds.iter().map(|f| f.pages).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.feeds.iter().map(|f| f.errors).sum()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.finished_at
            .signed_duration_since(self.started_at)
            .num_milliseconds() as f64
            / 1000.0
    }
}

/// What the dedup filter saw and kept.
#[derive(Debug, Clone, Default)]
pub struct DedupReport {
    pub pages: usize,
    pub records: u64,
    pub forwarded: u64,
    pub parse_errors: u64,
    pub marshal_errors: u64,
    /// Identity -> number of dropped repeats.
    pub duplicates: HashMap<String, u64>,
}

impl DedupReport {
    pub fn duplicate_count(&self) -> u64 {
        self.duplicates.values().sum()
    }

    /// Distinct duplicated identities, sorted.
    pub fn duplicated_identities(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.duplicates.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
