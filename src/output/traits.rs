//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! summary structure they render.

use crate::crawler::CrawledPage;
use crate::output::stats::CrawlStatistics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    // Run metadata
    pub start_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,
    pub max_pages: usize,
    pub concurrency: usize,

    // Aggregated page statistics
    pub statistics: CrawlStatistics,
}

impl CrawlSummary {
    /// Builds a summary for a finished crawl
    pub fn new(
        start_url: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        pages: &[CrawledPage],
    ) -> Self {
        Self {
            start_url: start_url.into(),
            started_at,
            finished_at,
            config_hash: None,
            max_pages: 0,
            concurrency: 0,
            statistics: CrawlStatistics::from_pages(pages),
        }
    }

    /// Attaches the configuration hash
    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }

    /// Records the limits the crawl ran with
    pub fn with_limits(mut self, max_pages: usize, concurrency: usize) -> Self {
        self.max_pages = max_pages;
        self.concurrency = concurrency;
        self
    }

    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0
    }

    /// Returns the share of pages with a 2xx response, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.statistics.total_pages;
        if total == 0 {
            return 0.0;
        }
        (self.statistics.successful_pages() as f64 / total as f64) * 100.0
    }

    /// Returns the share of pages whose fetch failed, as a percentage
    pub fn error_rate(&self) -> f64 {
        let total = self.statistics.total_pages;
        if total == 0 {
            return 0.0;
        }
        (self.statistics.failed_pages as f64 / total as f64) * 100.0
    }
}

/// Trait for output handlers
///
/// An output handler receives the finished crawl and persists it in its own
/// format.
pub trait OutputHandler {
    /// Short name used in log messages
    fn name(&self) -> &'static str;

    /// Writes the crawl results
    ///
    /// # Arguments
    ///
    /// * `summary` - Run metadata and aggregated statistics
    /// * `pages` - Every crawled page, in completion order
    fn write(&self, summary: &CrawlSummary, pages: &[CrawledPage]) -> OutputResult<()>;
}
