//! Statistics computed from crawl results
//!
//! This module aggregates a completed crawl's pages into counts and
//! averages, and prints them to stdout.

use crate::crawler::CrawledPage;
use serde::Serialize;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStatistics {
    /// Total number of pages recorded
    pub total_pages: usize,

    /// Pages that produced a response (any HTTP status)
    pub fetched_pages: usize,

    /// Pages whose fetch failed outright
    pub failed_pages: usize,

    /// Count of fetched pages by HTTP status
    pub status_codes: BTreeMap<u16, usize>,

    /// Valid links pointing at the crawled host
    pub internal_links: usize,

    /// Valid links pointing elsewhere
    pub external_links: usize,

    /// Valid links marked `rel="nofollow"`
    pub nofollow_links: usize,

    /// Anchors with empty, javascript: or malformed hrefs
    pub invalid_links: usize,

    /// tel: and mailto: links
    pub special_links: usize,

    /// Special links that failed format validation
    pub invalid_special_links: usize,

    /// Images found across all pages
    pub images: usize,

    /// Images without an `alt` attribute
    pub images_missing_alt: usize,

    /// Images loaded lazily
    pub lazy_images: usize,

    /// Pages without a `<title>`
    pub pages_missing_title: usize,

    /// Mean fetch time of fetched pages in milliseconds
    pub average_fetch_ms: Option<f64>,

    /// Failed pages with their error messages
    pub errors: Vec<(String, String)>,
}

impl CrawlStatistics {
    /// Aggregates statistics over a crawl's pages
    pub fn from_pages(pages: &[CrawledPage]) -> Self {
        let mut stats = Self {
            total_pages: pages.len(),
            ..Default::default()
        };
        let mut total_fetch_ms: u64 = 0;

        for page in pages {
            if let Some(error) = &page.error {
                stats.failed_pages += 1;
                stats.errors.push((page.url.clone(), error.clone()));
            }

            if let Some(fetch) = &page.fetch {
                stats.fetched_pages += 1;
                total_fetch_ms += fetch.elapsed_ms;
                *stats.status_codes.entry(fetch.status_code).or_insert(0) += 1;
            }

            if let Some(content) = &page.content {
                for link in &content.links {
                    if link.is_internal {
                        stats.internal_links += 1;
                    } else {
                        stats.external_links += 1;
                    }
                    if link.is_nofollow {
                        stats.nofollow_links += 1;
                    }
                }

                stats.invalid_links += content.invalid_links.len();
                stats.special_links += content.special_links.len();
                stats.invalid_special_links +=
                    content.special_links.iter().filter(|l| !l.is_valid).count();

                stats.images += content.images.len();
                stats.images_missing_alt +=
                    content.images.iter().filter(|i| i.alt.is_none()).count();
                stats.lazy_images += content.images.iter().filter(|i| i.is_lazy_loaded).count();

                if content.title.is_none() {
                    stats.pages_missing_title += 1;
                }
            }
        }

        if stats.fetched_pages > 0 {
            stats.average_fetch_ms = Some(total_fetch_ms as f64 / stats.fetched_pages as f64);
        }

        stats
    }

    /// Fetched pages with a 2xx status
    pub fn successful_pages(&self) -> usize {
        self.status_codes
            .iter()
            .filter(|(code, _)| (200..300).contains(*code))
            .map(|(_, count)| count)
            .sum()
    }

    /// Total number of valid links
    pub fn total_links(&self) -> usize {
        self.internal_links + self.external_links
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", stats.total_pages);
    println!("  Fetched: {}", stats.fetched_pages);
    println!("  Failed: {}", stats.failed_pages);
    if let Some(avg) = stats.average_fetch_ms {
        println!("  Average fetch time: {:.0}ms", avg);
    }
    println!();

    if !stats.status_codes.is_empty() {
        println!("Status Codes:");
        for (code, count) in &stats.status_codes {
            let percentage = (*count as f64 / stats.total_pages as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", code, count, percentage);
        }
        println!();
    }

    println!("Links:");
    println!("  Internal: {}", stats.internal_links);
    println!("  External: {}", stats.external_links);
    println!("  Nofollow: {}", stats.nofollow_links);
    println!("  Invalid: {}", stats.invalid_links);
    println!(
        "  Special (tel/mailto): {} ({} invalid)",
        stats.special_links, stats.invalid_special_links
    );
    println!();

    println!("Images:");
    println!("  Total: {}", stats.images);
    println!("  Missing alt: {}", stats.images_missing_alt);
    println!("  Lazy loaded: {}", stats.lazy_images);
    println!();

    if !stats.errors.is_empty() {
        println!("Errors ({}):", stats.errors.len());
        for (url, error) in stats.errors.iter().take(20) {
            println!("  - {}: {}", url, error);
        }
        println!();
    }

    let success_rate = if stats.total_pages > 0 {
        (stats.successful_pages() as f64 / stats.total_pages as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages returned 2xx)",
        success_rate,
        stats.successful_pages(),
        stats.total_pages
    );
}
