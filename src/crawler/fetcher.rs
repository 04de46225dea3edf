//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the crawler:
//! - Building HTTP clients with the bot user agent
//! - GET requests that fetch and time a full page
//! - HEAD liveness checks that never fail (status `0` means unreachable)
//! - HEAD redirect tracing with manual `Location` following

use crate::CrawlError;
use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, LOCATION};
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

/// User agent sent with every request
pub const USER_AGENT: &str = "SEOmatorBot/1.0 (+https://seomator.com/bot)";

/// `Accept` header for page fetches
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// `Accept-Language` header for page fetches
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// Default timeout for full page fetches
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default timeout for HEAD liveness and redirect checks
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default hop budget for redirect tracing
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Status reported when a URL could not be reached at all
pub const STATUS_UNREACHABLE: u16 = 0;

/// Result of fetching a single page
///
/// Immutable once produced. Header names are lowercase.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,

    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Response headers with lowercase names
    pub headers: HashMap<String, String>,

    /// Page body content
    #[serde(skip)]
    pub raw_body: String,

    /// Wall-clock time from sending the request to reading the full body
    pub elapsed_ms: u64,
}

impl FetchResult {
    /// Parses the body into a queryable document tree
    ///
    /// Parsing is lenient: non-HTML bodies produce a mostly empty document
    /// rather than an error.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.raw_body)
    }

    /// Looks up a response header by (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the `content-type` header, if present
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Outcome of tracing a redirect chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectResult {
    /// The last URL requested
    pub final_url: String,

    /// Final status code, or `0` if the chain could not be resolved
    pub status_code: u16,

    /// Number of redirects followed
    pub redirect_count: u32,

    /// Every URL requested, starting with the original
    pub chain: Vec<String>,
}

/// Builds an HTTP client with the crawler's user agent
///
/// # Arguments
///
/// * `user_agent` - The user agent string
/// * `follow_redirects` - Whether the transport follows redirects itself
///
/// # Example
///
/// ```no_run
/// use seomator_crawler::crawler::{build_http_client, USER_AGENT};
///
/// let client = build_http_client(USER_AGENT, true).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, follow_redirects: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect_policy(follow_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

fn redirect_policy(follow_redirects: bool) -> Policy {
    if follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    }
}

/// Builds the client for HEAD checks
///
/// Content decoding is off so requests carry no `accept-encoding`; reqwest
/// still sends its default `accept: */*`.
fn build_check_client(user_agent: &str, follow_redirects: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect_policy(follow_redirects))
        .no_gzip()
        .no_brotli()
        .build()
}

/// HTTP fetcher shared by all crawl workers
///
/// Holds a decoding client for page fetches, plus two plain clients for
/// HEAD checks: one that follows redirects for liveness, and one that does
/// not, for manual redirect tracing. Cloning is cheap; clones share
/// connection pools.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    check_client: Client,
    manual_redirect_client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the default bot user agent
    pub fn new() -> Result<Self, CrawlError> {
        Self::with_user_agent(USER_AGENT)
    }

    /// Creates a fetcher with a custom user agent
    pub fn with_user_agent(user_agent: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            client: build_http_client(user_agent, true)?,
            check_client: build_check_client(user_agent, true)?,
            manual_redirect_client: build_check_client(user_agent, false)?,
        })
    }

    /// Fetches a page with GET, following redirects
    ///
    /// The body is read in full and kept as text regardless of the declared
    /// content type; non-2xx statuses are returned as normal results.
    ///
    /// # Errors
    ///
    /// * `CrawlError::Timeout` - No complete response within `timeout`
    /// * `CrawlError::Http` - Any other transport failure
    pub async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<FetchResult, CrawlError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = lowercase_headers(response.headers());

        let raw_body = response
            .text()
            .await
            .map_err(|e| classify_error(url, e))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "Fetched {} -> {} ({} bytes, {}ms)",
            url,
            status_code,
            raw_body.len(),
            elapsed_ms
        );

        Ok(FetchResult {
            url: url.to_string(),
            final_url,
            status_code,
            headers,
            raw_body,
            elapsed_ms,
        })
    }

    /// Checks whether a URL is alive with a HEAD request
    ///
    /// Returns the HTTP status, or `0` on any network failure or timeout.
    /// Never fails.
    pub async fn fetch_url(&self, url: &str, timeout: Duration) -> u16 {
        match self.check_client.head(url).timeout(timeout).send().await {
            Ok(response) => response.status().as_u16(),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                STATUS_UNREACHABLE
            }
        }
    }

    /// Traces a redirect chain with HEAD requests
    ///
    /// Redirects are followed manually, resolving each `Location` against
    /// the current URL, for at most `max_redirects` hops. Every requested
    /// URL is recorded in `chain`.
    ///
    /// If a request fails, a `Location` is unusable, or the hop budget runs
    /// out while still redirecting, the result carries status `0` and the
    /// chain built so far.
    pub async fn fetch_url_with_redirects(
        &self,
        url: &str,
        timeout: Duration,
        max_redirects: u32,
    ) -> RedirectResult {
        let mut chain = Vec::new();
        let mut current = url.to_string();
        let mut redirect_count = 0;

        loop {
            chain.push(current.clone());

            let response = match self
                .manual_redirect_client
                .head(&current)
                .timeout(timeout)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("Redirect trace stopped at {}: {}", current, e);
                    return RedirectResult {
                        final_url: current,
                        status_code: STATUS_UNREACHABLE,
                        redirect_count,
                        chain,
                    };
                }
            };

            let status = response.status();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let location = match location {
                Some(location) if status.is_redirection() => location,
                _ => {
                    return RedirectResult {
                        final_url: current,
                        status_code: status.as_u16(),
                        redirect_count,
                        chain,
                    };
                }
            };

            if redirect_count >= max_redirects {
                tracing::debug!(
                    "Redirect budget of {} exhausted at {}",
                    max_redirects,
                    current
                );
                return RedirectResult {
                    final_url: current,
                    status_code: STATUS_UNREACHABLE,
                    redirect_count,
                    chain,
                };
            }

            let next = match Url::parse(&current).and_then(|base| base.join(&location)) {
                Ok(next) => next.to_string(),
                Err(e) => {
                    tracing::debug!("Unusable Location '{}' from {}: {}", location, current, e);
                    return RedirectResult {
                        final_url: current,
                        status_code: STATUS_UNREACHABLE,
                        redirect_count,
                        chain,
                    };
                }
            };

            redirect_count += 1;
            current = next;
        }
    }
}

/// Maps a reqwest error onto the crawler's error taxonomy
fn classify_error(url: &str, e: reqwest::Error) -> CrawlError {
    if e.is_timeout() {
        CrawlError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Copies response headers into a map keyed by lowercase name
///
/// Repeated headers are joined with `", "`.
fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    map
}
