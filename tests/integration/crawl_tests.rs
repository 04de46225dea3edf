//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock sites and run the full crawl
//! cycle end-to-end.

use seomator_crawler::crawler::{CoreWebVitals, CrawlProgress, CrawledPage, Crawler, CrawlerOptions};
use seomator_crawler::url::UrlFilterOptions;
use seomator_crawler::{CrawlError, CrawlPhase};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

fn options(max_pages: usize, concurrency: usize) -> CrawlerOptions {
    CrawlerOptions {
        max_pages,
        concurrency,
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn urls(pages: &[CrawledPage]) -> HashSet<String> {
    pages.iter().map(|p| p.url.clone()).collect()
}

fn assert_no_duplicates(pages: &[CrawledPage]) {
    assert_eq!(
        urls(pages).len(),
        pages.len(),
        "a URL was processed more than once"
    );
}

/// Mounts a small site:
///
/// ```text
/// /  -> /a, /b
/// /a -> /, /b, /c
/// /b -> /a
/// /c -> (404)
/// ```
async fn mount_small_site(server: &MockServer) {
    mount_page(server, "/", &html("Home", &["/a", "/b"])).await;
    mount_page(server, "/a", &html("A", &["/", "/b", "/c"])).await;
    mount_page(server, "/b", &html("B", &["/a"])).await;
}

#[tokio::test]
async fn test_full_crawl_small_site() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_small_site(&mock_server).await;

    let mut crawler = Crawler::new(options(100, 3)).unwrap();
    let pages = crawler.crawl(&format!("{}/", base)).await.unwrap();

    let expected: HashSet<String> = ["/", "/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    assert_eq!(urls(&pages), expected);
    assert_no_duplicates(&pages);
    assert_eq!(crawler.phase(), CrawlPhase::Done);

    let missing = pages
        .iter()
        .find(|p| p.url.ends_with("/c"))
        .unwrap();
    assert_eq!(missing.status_code(), Some(404));
    assert!(missing.error.is_none());

    let home = pages.iter().find(|p| p.url == format!("{}/", base)).unwrap();
    assert_eq!(
        home.content.as_ref().and_then(|c| c.title.as_deref()),
        Some("Home")
    );
    assert_eq!(home.links().len(), 2);
}

#[tokio::test]
async fn test_max_pages_one_yields_one_page() {
    let mock_server = MockServer::start().await;
    let links: Vec<String> = (0..20).map(|i| format!("/page{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&mock_server, "/", &html("Home", &link_refs)).await;

    let mut crawler = Crawler::new(options(1, 5)).unwrap();
    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].url, format!("{}/", mock_server.uri()));
}

#[tokio::test]
async fn test_page_budget_never_exceeded() {
    let mock_server = MockServer::start().await;
    let links: Vec<String> = (0..30).map(|i| format!("/page{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    let hub = html("Hub", &link_refs);

    // Every page links to every other page
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(hub.as_str())
                .insert_header("content-type", "text/html")
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&mock_server)
        .await;

    for (max_pages, concurrency) in [(5, 8), (7, 3), (10, 10)] {
        let mut crawler = Crawler::new(options(max_pages, concurrency)).unwrap();
        let pages = crawler
            .crawl(&format!("{}/", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(pages.len(), max_pages);
        assert_no_duplicates(&pages);
    }
}

#[tokio::test]
async fn test_idle_workers_wait_for_slow_discovery() {
    let mock_server = MockServer::start().await;

    // The seed page is slow; the other workers must not give up meanwhile
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html("Home", &["/a", "/b", "/c"]).as_str())
                .insert_header("content-type", "text/html")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/a", &html("A", &["/d"])).await;
    mount_page(&mock_server, "/b", &html("B", &[])).await;
    mount_page(&mock_server, "/c", &html("C", &[])).await;
    mount_page(&mock_server, "/d", &html("D", &[])).await;

    let mut crawler = Crawler::new(options(100, 4)).unwrap();
    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 5);
    assert_no_duplicates(&pages);
}

#[tokio::test]
async fn test_query_variants_collapse() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &html(
            "Home",
            &[
                "/p?b=2&a=1",
                "/p?a=1&b=2&utm_source=newsletter",
                "/p/?a=1&b=2#section",
                "/q/",
                "/q",
            ],
        ),
    )
    .await;
    mount_page(&mock_server, "/p", &html("P", &[])).await;
    mount_page(&mock_server, "/q", &html("Q", &[])).await;

    let mut crawler = Crawler::new(options(100, 2)).unwrap();
    let pages = crawler.crawl(&format!("{}/", base)).await.unwrap();

    let expected: HashSet<String> = [
        format!("{}/", base),
        format!("{}/p?a=1&b=2", base),
        format!("{}/q", base),
    ]
    .into_iter()
    .collect();
    assert_eq!(urls(&pages), expected);
}

#[tokio::test]
async fn test_exclude_filter_respected() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        &html("Home", &["/blog/post", "/admin", "/admin/users"]),
    )
    .await;
    mount_page(&mock_server, "/blog/post", &html("Post", &[])).await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(CrawlerOptions {
        url_filter: UrlFilterOptions {
            exclude_patterns: vec!["/admin/**".to_string()],
            ..Default::default()
        },
        ..options(100, 2)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| !p.url.contains("/admin")));
}

#[tokio::test]
async fn test_include_filter_limits_discovery() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", &html("Home", &["/docs/intro", "/about"])).await;
    mount_page(&mock_server, "/docs/intro", &html("Intro", &["/docs/setup"])).await;
    mount_page(&mock_server, "/docs/setup", &html("Setup", &[])).await;

    let mut crawler = Crawler::new(CrawlerOptions {
        url_filter: UrlFilterOptions {
            include_patterns: vec!["/docs/**".to_string()],
            ..Default::default()
        },
        ..options(100, 2)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    // The seed is always crawled; only /docs pages are discovered from it
    assert_eq!(pages.len(), 3);
    assert!(!pages.iter().any(|p| p.url.ends_with("/about")));
}

#[tokio::test]
async fn test_nofollow_external_and_assets_not_followed() {
    let mock_server = MockServer::start().await;
    let body = r#"<html><body>
        <a href="/follow">Follow</a>
        <a href="/nofollow" rel="nofollow">Skip</a>
        <a href="https://external.example.org/page">External</a>
        <a href="/files/report.pdf">PDF</a>
        <a href="/static/app.js">JS</a>
        <a href="mailto:info@example.com">Mail</a>
        <a href="javascript:void(0)">JS link</a>
    </body></html>"#;
    mount_page(&mock_server, "/", body).await;
    mount_page(&mock_server, "/follow", &html("Follow", &[])).await;

    let mut crawler = Crawler::new(options(100, 3)).unwrap();
    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let expected: HashSet<String> = [
        format!("{}/", mock_server.uri()),
        format!("{}/follow", mock_server.uri()),
    ]
    .into_iter()
    .collect();
    assert_eq!(urls(&pages), expected);

    let home = pages
        .iter()
        .find(|p| p.url == format!("{}/", mock_server.uri()))
        .unwrap();
    let content = home.content.as_ref().unwrap();
    assert_eq!(content.special_links.len(), 1);
    assert_eq!(content.invalid_links.len(), 1);
}

#[tokio::test]
async fn test_fetch_failures_recorded() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", &html("Home", &["/slow", "/ok"])).await;
    mount_page(&mock_server, "/ok", &html("OK", &[])).await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_millis(2000)),
        )
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(CrawlerOptions {
        timeout: Duration::from_millis(300),
        ..options(100, 2)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);

    let slow = pages.iter().find(|p| p.url.ends_with("/slow")).unwrap();
    assert!(!slow.is_success());
    assert!(slow.fetch.is_none());
    assert!(slow.content.is_none());
    assert!(slow.error.as_deref().unwrap().contains("timeout"));

    let ok = pages.iter().find(|p| p.url.ends_with("/ok")).unwrap();
    assert!(ok.is_success());
}

#[tokio::test]
async fn test_unreachable_seed_recorded_as_failure() {
    let mut crawler = Crawler::new(options(10, 2)).unwrap();
    let pages = crawler.crawl("http://127.0.0.1:9/").await.unwrap();

    assert_eq!(pages.len(), 1);
    assert!(pages[0].error.is_some());
}

#[tokio::test]
async fn test_invalid_start_url_is_fatal() {
    let mut crawler = Crawler::new(options(10, 2)).unwrap();
    let result = crawler.crawl("::not a url::").await;
    assert!(matches!(result, Err(CrawlError::Url(_))));
}

#[tokio::test]
async fn test_progress_callback_reports_each_page() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let seen: Arc<Mutex<Vec<CrawlProgress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut crawler = Crawler::new(CrawlerOptions {
        on_progress: Some(Arc::new(move |progress: &CrawlProgress| {
            sink.lock().unwrap().push(progress.clone());
        })),
        ..options(100, 1)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), pages.len());

    // With one worker the reports are strictly sequential
    assert_eq!(seen[0].crawled, 0);
    assert_eq!(seen[0].total, 1);
    assert_eq!(seen[0].discovered, 1);
    assert_eq!(seen[0].current_url, format!("{}/", mock_server.uri()));
    for (i, progress) in seen.iter().enumerate() {
        assert_eq!(progress.crawled, i);
        assert!(progress.total >= progress.crawled + 1);
    }
}

#[tokio::test]
async fn test_vitals_attached_and_failures_swallowed() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", &html("Home", &["/broken"])).await;
    mount_page(&mock_server, "/broken", &html("Broken", &[])).await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut crawler = Crawler::new(CrawlerOptions {
        vitals: Some(Arc::new(move |url: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if url.ends_with("/broken") {
                    Err(CrawlError::Vitals("browser crashed".to_string()))
                } else {
                    Ok(CoreWebVitals {
                        lcp_ms: Some(1800.0),
                        cls: Some(0.05),
                        ..Default::default()
                    })
                }
            }
        })),
        ..options(100, 2)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let home = pages.iter().find(|p| p.url.ends_with('/')).unwrap();
    assert_eq!(home.vitals.as_ref().and_then(|v| v.lcp_ms), Some(1800.0));

    let broken = pages.iter().find(|p| p.url.ends_with("/broken")).unwrap();
    assert!(broken.vitals.is_none());
    assert!(broken.is_success());
}

#[tokio::test]
async fn test_cancellation_stops_crawl() {
    let mock_server = MockServer::start().await;
    let links: Vec<String> = (0..50).map(|i| format!("/page{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&mock_server, "/", &html("Home", &link_refs)).await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>leaf</p>")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&mock_server)
        .await;

    let cancel = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&cancel);

    let mut crawler = Crawler::new(CrawlerOptions {
        cancel: Some(Arc::clone(&cancel)),
        on_progress: Some(Arc::new(move |progress: &CrawlProgress| {
            if progress.crawled >= 5 {
                trigger.store(true, Ordering::SeqCst);
            }
        })),
        ..options(100, 2)
    })
    .unwrap();

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert!(pages.len() < 51);
    assert!(pages.len() >= 5);
    assert_no_duplicates(&pages);
}

#[tokio::test]
async fn test_crawler_is_reusable() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;
    let start = format!("{}/", mock_server.uri());

    let mut crawler = Crawler::new(options(100, 3)).unwrap();

    let first = crawler.crawl(&start).await.unwrap();
    let second = crawler.crawl(&start).await.unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(urls(&first), urls(&second));
    assert_eq!(crawler.phase(), CrawlPhase::Done);
}

#[tokio::test]
async fn test_crawler_reusable_after_dropped_crawl() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html("Slow", &[]))
                .set_delay(Duration::from_millis(2000)),
        )
        .mount(&mock_server)
        .await;

    let mut crawler = Crawler::new(options(100, 3)).unwrap();

    let slow_start = format!("{}/slow", mock_server.uri());
    let timed_out = tokio::time::timeout(Duration::from_millis(100), crawler.crawl(&slow_start))
        .await
        .is_err();
    assert!(timed_out);
    assert_eq!(crawler.phase(), CrawlPhase::Done);

    let pages = crawler
        .crawl(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(pages.len(), 4);
    assert_eq!(crawler.phase(), CrawlPhase::Done);
}

#[tokio::test]
async fn test_crawl_with_limits_overrides() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let mut crawler = Crawler::new(options(100, 3)).unwrap();
    let pages = crawler
        .crawl_with_limits(&format!("{}/", mock_server.uri()), Some(2), Some(1))
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
}
