//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, status codes, failed pages, and a page index.

use crate::crawler::CrawledPage;
use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum number of rows in the page index table
const MAX_PAGE_ROWS: usize = 200;

/// Writes a markdown summary to a file
pub struct MarkdownOutput {
    path: PathBuf,
}

impl MarkdownOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputHandler for MarkdownOutput {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn write(&self, summary: &CrawlSummary, pages: &[CrawledPage]) -> OutputResult<()> {
        generate_markdown_summary(summary, pages, &self.path)
    }
}

/// Generates a markdown summary and writes it to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    summary: &CrawlSummary,
    pages: &[CrawledPage],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary, pages);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary, pages: &[CrawledPage]) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# SEOmator Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", summary.start_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration_seconds()
    ));
    if summary.max_pages > 0 {
        md.push_str(&format!("- **Max Pages**: {}\n", summary.max_pages));
        md.push_str(&format!("- **Concurrency**: {}\n", summary.concurrency));
    }
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Fetched**: {}\n", stats.fetched_pages));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed_pages));
    if let Some(avg) = stats.average_fetch_ms {
        md.push_str(&format!("- **Average Fetch Time**: {:.0} ms\n", avg));
    }
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", summary.error_rate()));

    // Status code breakdown
    if !stats.status_codes.is_empty() {
        md.push_str("## Status Codes\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for (code, count) in &stats.status_codes {
            md.push_str(&format!("| {} | {} |\n", code, count));
        }
        md.push('\n');
    }

    // Links and images
    md.push_str("## Links\n\n");
    md.push_str("| Kind | Count |\n");
    md.push_str("|------|-------|\n");
    md.push_str(&format!("| Internal | {} |\n", stats.internal_links));
    md.push_str(&format!("| External | {} |\n", stats.external_links));
    md.push_str(&format!("| Nofollow | {} |\n", stats.nofollow_links));
    md.push_str(&format!("| Invalid | {} |\n", stats.invalid_links));
    md.push_str(&format!("| Special (tel/mailto) | {} |\n", stats.special_links));
    md.push_str(&format!(
        "| Special, invalid | {} |\n\n",
        stats.invalid_special_links
    ));

    md.push_str("## Images\n\n");
    md.push_str(&format!("- **Total**: {}\n", stats.images));
    md.push_str(&format!("- **Missing alt**: {}\n", stats.images_missing_alt));
    md.push_str(&format!("- **Lazy loaded**: {}\n\n", stats.lazy_images));

    // Failed pages
    if !stats.errors.is_empty() {
        md.push_str("## Failed Pages\n\n");
        md.push_str("| URL | Error |\n");
        md.push_str("|-----|-------|\n");
        for (url, error) in stats.errors.iter().take(50) {
            md.push_str(&format!("| {} | {} |\n", url, escape_cell(error)));
        }
        md.push('\n');
    }

    // Page index
    if !pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Title | Links |\n");
        md.push_str("|-----|--------|-------|-------|\n");
        for page in pages.iter().take(MAX_PAGE_ROWS) {
            let status = page
                .status_code()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let title = page
                .content
                .as_ref()
                .and_then(|c| c.title.as_deref())
                .map(escape_cell)
                .unwrap_or_default();
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                page.url,
                status,
                title,
                page.links().len()
            ));
        }
        if pages.len() > MAX_PAGE_ROWS {
            md.push_str(&format!("\n... and {} more\n", pages.len() - MAX_PAGE_ROWS));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
