//! Crawl lifecycle state
//!
//! A `Crawler` moves through `CrawlPhase::Idle` → `Running` → `Done` for each
//! call to `crawl`, and may start again from `Done`.

mod crawl_phase;

pub use crawl_phase::CrawlPhase;
