//! SEOmator crawler entry point
//!
//! This is the command-line interface for the SEOmator site crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use seomator_crawler::config::{load_config_with_hash, validate, Config};
use seomator_crawler::crawler::{
    CrawlProgress, Crawler, Fetcher, DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_REDIRECTS,
};
use seomator_crawler::output::{handlers_for, print_statistics, write_all, CrawlSummary};
use seomator_crawler::url::UrlFilter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// SEOmator crawler: a bounded-concurrency site crawler
///
/// Crawls a single host breadth-first with a fixed pool of workers,
/// extracting links, images and other page signals for SEO auditing.
#[derive(Parser, Debug)]
#[command(name = "seomator-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A bounded-concurrency site crawler for SEO audits", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "START_URL", required_unless_present = "check")]
    start_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Number of concurrent workers
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Per-page timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Only crawl paths matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    include: Vec<String>,

    /// Skip paths matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Write a markdown summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Write all crawled pages as JSON to this file
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration without crawling
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Trace the redirect chain of a single URL and exit
    #[arg(long, value_name = "URL")]
    check: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(url) = &cli.check {
        return handle_check(url).await;
    }

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    let start_url = cli
        .start_url
        .clone()
        .context("A start URL is required")?;

    if cli.dry_run {
        handle_dry_run(&config, &start_url);
        return Ok(());
    }

    handle_crawl(config, config_hash, &start_url).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seomator_crawler=info,warn"),
            1 => EnvFilter::new("seomator_crawler=debug,info"),
            2 => EnvFilter::new("seomator_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.crawler.timeout_ms = timeout_ms;
    }
    if !cli.include.is_empty() {
        config.filter.include = cli.include.clone();
    }
    if !cli.exclude.is_empty() {
        config.filter.exclude = cli.exclude.clone();
    }
    if let Some(path) = &cli.summary {
        config.output.summary_path = Some(path.to_string_lossy().into_owned());
    }
    if let Some(path) = &cli.json {
        config.output.json_path = Some(path.to_string_lossy().into_owned());
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, start_url: &str) {
    println!("=== SEOmator Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    if let Some(ua) = &config.crawler.user_agent {
        println!("  User agent: {}", ua);
    }

    println!("\nFilter:");
    println!("  Include: {:?}", config.filter.include);
    println!("  Exclude: {:?}", config.filter.exclude);
    println!("  Allowed query params: {:?}", config.filter.allowed_query_params);
    println!(
        "  Dropped query param prefixes: {:?}",
        config.filter.dropped_query_param_prefixes
    );

    println!("\nOutput:");
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("(none)")
    );
    println!(
        "  JSON: {}",
        config.output.json_path.as_deref().unwrap_or("(none)")
    );

    let filter = UrlFilter::new(config.filter_options());
    let normalized = filter.normalize_url(start_url);
    println!("\nStart URL: {}", normalized);

    println!("\n✓ Configuration is valid");
    if filter.should_crawl(&normalized) {
        println!("✓ Start URL passes the include/exclude filter");
    } else {
        println!("✗ Start URL is excluded by the filter; only the start page would be crawled");
    }
}

/// Handles the --check mode: prints the redirect chain of one URL
async fn handle_check(url: &str) -> anyhow::Result<()> {
    let fetcher = Fetcher::new().context("Failed to build HTTP client")?;
    let result = fetcher
        .fetch_url_with_redirects(url, DEFAULT_CHECK_TIMEOUT, DEFAULT_MAX_REDIRECTS)
        .await;

    println!("=== Redirect Check ===\n");
    for (hop, step) in result.chain.iter().enumerate() {
        println!("  {}. {}", hop + 1, step);
    }
    println!();

    if result.status_code == 0 {
        println!(
            "✗ Unreachable or too many redirects ({} followed)",
            result.redirect_count
        );
    } else {
        println!(
            "✓ {} -> {} after {} redirect(s)",
            result.status_code, result.final_url, result.redirect_count
        );
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    start_url: &str,
) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight pages");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut options = config.crawler_options();
    options.cancel = Some(Arc::clone(&cancel));
    options.on_progress = Some(Arc::new(|progress: &CrawlProgress| {
        tracing::info!(
            "[{}/{}] {} ({} discovered)",
            progress.crawled + 1,
            progress.total,
            progress.current_url,
            progress.discovered
        );
    }));

    let mut crawler = Crawler::new(options).context("Failed to initialize crawler")?;

    let started_at = Utc::now();
    let pages = match crawler.crawl(start_url).await {
        Ok(pages) => pages,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    let finished_at = Utc::now();

    if cancel.load(Ordering::Relaxed) {
        tracing::warn!("Crawl was interrupted after {} pages", pages.len());
    }

    let summary = CrawlSummary::new(start_url, started_at, finished_at, &pages)
        .with_config_hash(config_hash)
        .with_limits(config.crawler.max_pages, config.crawler.concurrency);

    print_statistics(&summary.statistics);

    let handlers = handlers_for(&config.output);
    write_all(&handlers, &summary, &pages).context("Failed to write crawl output")?;

    if let Some(path) = &config.output.summary_path {
        println!("\n✓ Summary written to: {}", path);
    }
    if let Some(path) = &config.output.json_path {
        println!("✓ Pages exported to: {}", path);
    }

    tracing::info!("Crawl completed successfully");
    Ok(())
}
