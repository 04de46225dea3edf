use crate::crawler::{CrawlerOptions, DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES};
use crate::url::{UrlFilterOptions, DEFAULT_DROPPED_QUERY_PARAM_PREFIXES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-page timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Main configuration structure for the crawler CLI
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages to record
    pub max_pages: usize,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Per-page fetch timeout (milliseconds)
    pub timeout_ms: u64,

    /// Custom user-agent string; the bot default is used when absent
    pub user_agent: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: None,
        }
    }
}

/// URL filtering and normalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Glob patterns a path must match (empty = allow all)
    pub include: Vec<String>,

    /// Glob patterns that exclude a path
    pub exclude: Vec<String>,

    /// Query parameters kept during normalization (empty = keep all but dropped)
    pub allowed_query_params: Vec<String>,

    /// Query parameter name prefixes removed during normalization
    pub dropped_query_param_prefixes: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            allowed_query_params: Vec::new(),
            dropped_query_param_prefixes: DEFAULT_DROPPED_QUERY_PARAM_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the markdown summary file
    pub summary_path: Option<String>,

    /// Path to the JSON export of all crawled pages
    pub json_path: Option<String>,
}

impl Config {
    /// Builds the URL filter options described by the `[filter]` section
    pub fn filter_options(&self) -> UrlFilterOptions {
        UrlFilterOptions {
            include_patterns: self.filter.include.clone(),
            exclude_patterns: self.filter.exclude.clone(),
            allowed_query_params: self.filter.allowed_query_params.iter().cloned().collect(),
            dropped_query_param_prefixes: self.filter.dropped_query_param_prefixes.clone(),
        }
    }

    /// Builds crawler options from this configuration
    ///
    /// Callbacks and cancellation are left unset for the caller to attach.
    pub fn crawler_options(&self) -> CrawlerOptions {
        CrawlerOptions {
            max_pages: self.crawler.max_pages,
            concurrency: self.crawler.concurrency,
            timeout: Duration::from_millis(self.crawler.timeout_ms),
            url_filter: self.filter_options(),
            user_agent: self.crawler.user_agent.clone(),
            ..Default::default()
        }
    }
}
