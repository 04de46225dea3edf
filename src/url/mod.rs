//! URL handling module
//!
//! This module provides glob pattern compilation, URL normalization,
//! include/exclude filtering, and host helpers used by the crawler to decide
//! which discovered links join the frontier.

mod domain;
mod filter;
mod glob;

// Re-export main types and functions
pub use domain::{extract_domain, has_non_html_extension, is_same_host};
pub use filter::{UrlFilter, UrlFilterOptions, DEFAULT_DROPPED_QUERY_PARAM_PREFIXES};
pub use glob::GlobPattern;
