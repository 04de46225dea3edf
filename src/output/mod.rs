//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Aggregating crawl statistics
//! - Generating markdown summaries of crawl results
//! - Exporting every crawled page as JSON

mod json_output;
mod markdown;
pub mod stats;
mod traits;

pub use json_output::{write_json_report, JsonOutput};
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownOutput};
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;
use crate::crawler::CrawledPage;

/// Builds the output handlers requested by the `[output]` configuration
pub fn handlers_for(config: &OutputConfig) -> Vec<Box<dyn OutputHandler>> {
    let mut handlers: Vec<Box<dyn OutputHandler>> = Vec::new();

    if let Some(path) = &config.summary_path {
        handlers.push(Box::new(MarkdownOutput::new(path)));
    }
    if let Some(path) = &config.json_path {
        handlers.push(Box::new(JsonOutput::new(path)));
    }

    handlers
}

/// Runs every handler, stopping at the first failure
pub fn write_all(
    handlers: &[Box<dyn OutputHandler>],
    summary: &CrawlSummary,
    pages: &[CrawledPage],
) -> OutputResult<()> {
    for handler in handlers {
        tracing::debug!("Writing {} output", handler.name());
        handler.write(summary, pages)?;
    }
    Ok(())
}
