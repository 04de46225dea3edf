//! SEOmator crawler: a bounded-concurrency site crawler
//!
//! This crate implements the crawling core of the SEOmator audit tool: a
//! frontier crawler that walks a single site with a fixed pool of workers,
//! a URL normalizer/filter driven by glob patterns, and a page fetcher that
//! extracts links, images and other structured signals from each page.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Core Web Vitals measurement failed: {0}")]
    Vitals(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawledPage, Crawler, CrawlerOptions};
pub use state::CrawlPhase;
pub use url::{GlobPattern, UrlFilter, UrlFilterOptions};
