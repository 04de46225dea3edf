//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts, liveness checks and redirect tracing
//! - HTML parsing and link/image extraction
//! - Frontier bookkeeping (visited set, queue, page budget)
//! - Overall crawl coordination across concurrent workers

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod types;

pub use coordinator::{
    Crawler, CrawlerOptions, ProgressCallback, VitalsFuture, VitalsProvider, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_PAGES,
};
pub use fetcher::{
    build_http_client, FetchResult, Fetcher, RedirectResult, DEFAULT_CHECK_TIMEOUT,
    DEFAULT_MAX_REDIRECTS, DEFAULT_PAGE_TIMEOUT, STATUS_UNREACHABLE, USER_AGENT,
};
pub use frontier::{Dequeue, Frontier};
pub use parser::{
    extract_figures, extract_images, extract_links, extract_page, extract_pictures, extract_svgs,
    extract_title, ExtractedFigure, ExtractedImage, ExtractedLink, InlineSvg, InvalidLink,
    InvalidLinkReason, LinkSet, PageContent, PictureElement, PictureSource, SpecialLink,
    SpecialLinkKind,
};
pub use types::{CoreWebVitals, CrawlProgress, CrawledPage};
