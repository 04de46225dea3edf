//! Data types produced by a crawl

use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::{ExtractedLink, PageContent};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Core Web Vitals measured for a page by an external collaborator
///
/// Every metric is optional; a provider fills in whatever it could measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoreWebVitals {
    /// Largest Contentful Paint in milliseconds
    pub lcp_ms: Option<f64>,

    /// First Input Delay in milliseconds
    pub fid_ms: Option<f64>,

    /// Interaction to Next Paint in milliseconds
    pub inp_ms: Option<f64>,

    /// Cumulative Layout Shift (unitless)
    pub cls: Option<f64>,

    /// First Contentful Paint in milliseconds
    pub fcp_ms: Option<f64>,

    /// Time To First Byte in milliseconds
    pub ttfb_ms: Option<f64>,
}

/// One processed URL
///
/// Created exactly once per dequeued URL and never mutated after it joins
/// the crawl results.
#[derive(Debug, Clone, Serialize)]
pub struct CrawledPage {
    /// The normalized URL that was dequeued
    pub url: String,

    /// The network response, absent when the fetch failed
    pub fetch: Option<FetchResult>,

    /// Structured data extracted from the body, absent when the fetch failed
    pub content: Option<PageContent>,

    /// Core Web Vitals, when a provider was configured and succeeded
    pub vitals: Option<CoreWebVitals>,

    /// Failure message; consumers should skip content checks when set
    pub error: Option<String>,

    /// When processing of this page finished
    pub crawled_at: DateTime<Utc>,
}

impl CrawledPage {
    /// Creates a successful page record
    pub fn fetched(
        url: String,
        fetch: FetchResult,
        content: PageContent,
        vitals: Option<CoreWebVitals>,
    ) -> Self {
        Self {
            url,
            fetch: Some(fetch),
            content: Some(content),
            vitals,
            error: None,
            crawled_at: Utc::now(),
        }
    }

    /// Creates a page record for a failed fetch
    pub fn failed(url: String, error: impl Into<String>) -> Self {
        Self {
            url,
            fetch: None,
            content: None,
            vitals: None,
            error: Some(error.into()),
            crawled_at: Utc::now(),
        }
    }

    /// Returns true if the page was fetched (regardless of HTTP status)
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.fetch.is_some()
    }

    /// HTTP status of the response, if any
    pub fn status_code(&self) -> Option<u16> {
        self.fetch.as_ref().map(|f| f.status_code)
    }

    /// Valid links extracted from the page (empty for failed pages)
    pub fn links(&self) -> &[ExtractedLink] {
        self.content
            .as_ref()
            .map(|c| c.links.as_slice())
            .unwrap_or(&[])
    }
}

/// Snapshot passed to the progress callback before each fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlProgress {
    /// Pages completed so far
    pub crawled: usize,

    /// Completed + queued + in flight
    pub total: usize,

    /// The URL about to be fetched
    pub current_url: String,

    /// Distinct normalized URLs seen so far
    pub discovered: usize,
}
