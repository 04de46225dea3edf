//! Crawler coordinator - main crawl orchestration logic
//!
//! This module runs a crawl of a single host with a fixed pool of workers:
//! - Seeding the frontier with the normalized start URL
//! - Spawning `concurrency` workers that drain the frontier
//! - Fetching, extracting and recording each page
//! - Feeding newly discovered same-host links back into the frontier
//!
//! Workers that find the queue empty while other pages are still in flight
//! park on a [`Notify`] and are woken whenever URLs are enqueued or a page
//! finishes, so a crawl only ends when the budget is used up or no work can
//! appear anymore.

use crate::crawler::fetcher::{Fetcher, DEFAULT_PAGE_TIMEOUT};
use crate::crawler::frontier::{Dequeue, Frontier};
use crate::crawler::parser::{extract_page, PageContent};
use crate::crawler::types::{CoreWebVitals, CrawlProgress, CrawledPage};
use crate::state::CrawlPhase;
use crate::url::{extract_domain, has_non_html_extension, is_same_host, UrlFilter, UrlFilterOptions};
use crate::{CrawlError, UrlError};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinSet;
use url::Url;

/// Default page ceiling per crawl
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Default number of concurrent workers
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Callback invoked before each fetch
pub type ProgressCallback = Arc<dyn Fn(&CrawlProgress) + Send + Sync>;

/// Boxed future returned by a [`VitalsProvider`]
pub type VitalsFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CoreWebVitals, CrawlError>> + Send + 'a>>;

/// Measures Core Web Vitals for a fetched page
///
/// Any async closure `Fn(String) -> impl Future<Output = Result<CoreWebVitals, CrawlError>>`
/// implements this trait.
pub trait VitalsProvider: Send + Sync {
    fn measure<'a>(&'a self, url: &'a str) -> VitalsFuture<'a>;
}

impl<F, Fut> VitalsProvider for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CoreWebVitals, CrawlError>> + Send + 'static,
{
    fn measure<'a>(&'a self, url: &'a str) -> VitalsFuture<'a> {
        Box::pin(self(url.to_string()))
    }
}

/// Options for a [`Crawler`]
#[derive(Clone)]
pub struct CrawlerOptions {
    /// Maximum number of pages recorded per crawl
    pub max_pages: usize,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Per-fetch timeout
    pub timeout: Duration,

    /// Include/exclude patterns and query parameter rules
    pub url_filter: UrlFilterOptions,

    /// Called synchronously after each dequeue, before the fetch
    pub on_progress: Option<ProgressCallback>,

    /// Optional Core Web Vitals collaborator; its failures are ignored
    pub vitals: Option<Arc<dyn VitalsProvider>>,

    /// When set to true, workers stop picking up new URLs
    pub cancel: Option<Arc<AtomicBool>>,

    /// Overrides the default bot user-agent
    pub user_agent: Option<String>,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_PAGE_TIMEOUT,
            url_filter: UrlFilterOptions::default(),
            on_progress: None,
            vitals: None,
            cancel: None,
            user_agent: None,
        }
    }
}

impl fmt::Debug for CrawlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlerOptions")
            .field("max_pages", &self.max_pages)
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .field("url_filter", &self.url_filter)
            .field("on_progress", &self.on_progress.is_some())
            .field("vitals", &self.vitals.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Bounded-concurrency crawler for a single host
///
/// A `Crawler` can run several crawls one after another; each call to
/// [`Crawler::crawl`] starts from a fresh frontier. Overlapping crawls on
/// one instance are prevented by `&mut self`.
pub struct Crawler {
    options: CrawlerOptions,
    filter: Arc<UrlFilter>,
    fetcher: Fetcher,
    phase: CrawlPhase,
}

impl Crawler {
    /// Creates a crawler, compiling the URL filter and building the HTTP clients
    pub fn new(options: CrawlerOptions) -> Result<Self, CrawlError> {
        let fetcher = match &options.user_agent {
            Some(ua) => Fetcher::with_user_agent(ua)?,
            None => Fetcher::new()?,
        };
        let filter = Arc::new(UrlFilter::new(options.url_filter.clone()));

        Ok(Self {
            options,
            filter,
            fetcher,
            phase: CrawlPhase::Idle,
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn options(&self) -> &CrawlerOptions {
        &self.options
    }

    /// The filter used to normalize and admit discovered URLs
    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    /// Crawls the site of `start_url` with the configured limits
    ///
    /// Returns every processed page in completion order. The only error is
    /// a start URL that cannot be parsed or has no host; per-page failures
    /// are recorded in [`CrawledPage::error`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seomator_crawler::{Crawler, CrawlerOptions};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut crawler = Crawler::new(CrawlerOptions {
    ///     max_pages: 10,
    ///     ..Default::default()
    /// })?;
    /// let pages = crawler.crawl("https://example.com/").await?;
    /// assert!(pages.len() <= 10);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&mut self, start_url: &str) -> Result<Vec<CrawledPage>, CrawlError> {
        self.crawl_with_limits(start_url, None, None).await
    }

    /// Crawls with per-call overrides for the page ceiling and worker count
    pub async fn crawl_with_limits(
        &mut self,
        start_url: &str,
        max_pages: Option<usize>,
        concurrency: Option<usize>,
    ) -> Result<Vec<CrawledPage>, CrawlError> {
        let start = Url::parse(start_url)
            .map_err(|e| UrlError::Parse(format!("{}: {}", start_url, e)))?;
        let domain =
            extract_domain(&start).ok_or_else(|| UrlError::MissingHost(start_url.to_string()))?;

        let max_pages = max_pages.unwrap_or(self.options.max_pages);
        let concurrency = concurrency.unwrap_or(self.options.concurrency).max(1);

        self.phase = self.phase.transition(CrawlPhase::Running)?;
        let running = RunningPhase(&mut self.phase);

        let mut frontier = Frontier::new(max_pages);
        frontier.offer(self.filter.normalize_url(start.as_str()));

        let ctx = Arc::new(CrawlContext {
            frontier: Mutex::new(frontier),
            wakeup: Notify::new(),
            fetcher: self.fetcher.clone(),
            filter: Arc::clone(&self.filter),
            domain,
            timeout: self.options.timeout,
            on_progress: self.options.on_progress.clone(),
            vitals: self.options.vitals.clone(),
            cancel: self.options.cancel.clone(),
        });

        tracing::info!(
            "Starting crawl of {} (max {} pages, {} workers)",
            start,
            max_pages,
            concurrency
        );
        let started = Instant::now();

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            workers.spawn(run_worker(Arc::clone(&ctx), worker_id));
        }

        let mut panic = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() && panic.is_none() {
                    panic = Some(e.into_panic());
                } else {
                    tracing::error!("Crawl worker failed: {}", e);
                }
            }
        }

        drop(running);

        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }

        let frontier = match Arc::try_unwrap(ctx) {
            Ok(ctx) => ctx.frontier.into_inner().unwrap_or_else(PoisonError::into_inner),
            // Every worker has been joined, so no other owner is left
            Err(ctx) => std::mem::replace(&mut *ctx.lock(), Frontier::new(max_pages)),
        };

        tracing::info!(
            "Crawl completed: {} pages, {} URLs discovered in {:?}",
            frontier.completed(),
            frontier.visited_count(),
            started.elapsed()
        );

        Ok(frontier.into_results())
    }
}

/// Marks the crawler `Done` when a crawl call ends
///
/// Held for the whole call, so a crawl future dropped mid-run (timeout,
/// `select!`) still leaves the crawler reusable.
struct RunningPhase<'a>(&'a mut CrawlPhase);

impl Drop for RunningPhase<'_> {
    fn drop(&mut self) {
        *self.0 = CrawlPhase::Done;
    }
}

/// State shared by all workers of one crawl
struct CrawlContext {
    frontier: Mutex<Frontier>,
    wakeup: Notify,
    fetcher: Fetcher,
    filter: Arc<UrlFilter>,
    domain: String,
    timeout: Duration,
    on_progress: Option<ProgressCallback>,
    vitals: Option<Arc<dyn VitalsProvider>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl CrawlContext {
    fn lock(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// An in-flight URL's claim on the page budget
///
/// Dropping the slot without completing it (cancellation, panic) returns
/// the budget. Either way, parked workers are woken.
struct ActiveSlot<'a> {
    ctx: &'a CrawlContext,
    completed: bool,
}

impl<'a> ActiveSlot<'a> {
    fn new(ctx: &'a CrawlContext) -> Self {
        Self {
            ctx,
            completed: false,
        }
    }

    fn complete(mut self, page: CrawledPage) {
        self.ctx.lock().complete(page);
        self.completed = true;
    }
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.ctx.lock().release();
        }
        self.ctx.wakeup.notify_waiters();
    }
}

async fn run_worker(ctx: Arc<CrawlContext>, worker_id: usize) {
    loop {
        if ctx.is_cancelled() {
            tracing::debug!("Worker {} stopping: crawl cancelled", worker_id);
            break;
        }

        // Register for wake-ups before inspecting the frontier so a
        // notification between the check and the await is not lost
        let notified = ctx.wakeup.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let next = ctx.lock().dequeue();

        match next {
            Dequeue::Ready(url) => {
                let slot = ActiveSlot::new(&ctx);
                process_url(&ctx, url, slot).await;
            }
            Dequeue::Wait => {
                tracing::trace!("Worker {} idle, waiting for new URLs", worker_id);
                notified.await;
            }
            Dequeue::Exhausted => {
                tracing::debug!("Worker {} finished", worker_id);
                break;
            }
        }
    }
}

/// Fetches, extracts and records one URL
async fn process_url(ctx: &CrawlContext, url: String, slot: ActiveSlot<'_>) {
    let progress = ctx.lock().progress(&url);
    if let Some(on_progress) = &ctx.on_progress {
        on_progress(&progress);
    }

    if ctx.is_cancelled() {
        tracing::debug!("Skipping {}: crawl cancelled", url);
        return;
    }

    tracing::debug!("Fetching {}", url);

    let page = match ctx.fetcher.fetch_page(&url, ctx.timeout).await {
        Ok(fetch) => {
            let content = match Url::parse(&fetch.final_url).or_else(|_| Url::parse(&url)) {
                Ok(base) => extract_page(&fetch.raw_body, &base),
                Err(_) => PageContent::default(),
            };

            let added = discover_links(ctx, &content);
            if added > 0 {
                tracing::debug!("Queued {} new URLs from {}", added, url);
                ctx.wakeup.notify_waiters();
            }

            let vitals = measure_vitals(ctx, &url).await;
            CrawledPage::fetched(url, fetch, content, vitals)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            CrawledPage::failed(url, e.to_string())
        }
    };

    slot.complete(page);
}

async fn measure_vitals(ctx: &CrawlContext, url: &str) -> Option<CoreWebVitals> {
    let provider = ctx.vitals.as_ref()?;
    match provider.measure(url).await {
        Ok(vitals) => Some(vitals),
        Err(e) => {
            tracing::warn!("Core Web Vitals unavailable for {}: {}", url, e);
            None
        }
    }
}

/// Offers every followable internal link to the frontier
///
/// Returns the number of URLs that were newly enqueued.
fn discover_links(ctx: &CrawlContext, content: &PageContent) -> usize {
    let candidates: Vec<String> = content
        .links
        .iter()
        .filter(|link| link.is_internal && !link.is_nofollow)
        .filter_map(|link| {
            let normalized = ctx.filter.normalize_url(&link.href);
            let parsed = Url::parse(&normalized).ok()?;

            if !matches!(parsed.scheme(), "http" | "https") {
                return None;
            }
            if !is_same_host(&parsed, &ctx.domain) {
                tracing::trace!("Skipping {}: host changed during normalization", normalized);
                return None;
            }
            if has_non_html_extension(parsed.path()) {
                tracing::trace!("Skipping {}: non-HTML resource", normalized);
                return None;
            }
            if !ctx.filter.should_crawl(&normalized) {
                tracing::trace!("Skipping {}: filtered out", normalized);
                return None;
            }

            Some(normalized)
        })
        .collect();

    let mut frontier = ctx.lock();
    candidates
        .into_iter()
        .filter(|url| frontier.offer(url.clone()))
        .count()
}
