//! Integration tests for the page fetcher
//!
//! These tests use wiremock to check request headers, response handling,
//! liveness checks and manual redirect tracing.

use seomator_crawler::crawler::{Fetcher, STATUS_UNREACHABLE, USER_AGENT};
use seomator_crawler::CrawlError;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn without_accept_encoding(request: &Request) -> bool {
    !request
        .headers
        .keys()
        .any(|name| name.as_str().eq_ignore_ascii_case("accept-encoding"))
}

#[tokio::test]
async fn test_fetch_page_sends_bot_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", USER_AGENT))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Home</title></head></html>")
                .insert_header("content-type", "text/html")
                .insert_header("X-Custom-Header", "yes"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let url = format!("{}/", mock_server.uri());
    let result = fetcher.fetch_page(&url, TIMEOUT).await.unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.url, url);
    assert_eq!(result.final_url, url);
    assert!(result.raw_body.contains("<title>Home</title>"));
    assert_eq!(result.content_type(), Some("text/html"));
    assert_eq!(result.headers.get("x-custom-header").map(String::as_str), Some("yes"));
    assert!(!result.headers.contains_key("X-Custom-Header"));
    assert!(result.is_success());
}

#[tokio::test]
async fn test_fetch_page_non_2xx_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_page(&format!("{}/missing", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(result.status_code, 404);
    assert!(!result.is_success());
    assert_eq!(result.raw_body, "not found");
}

#[tokio::test]
async fn test_fetch_page_follows_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>moved</p>"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let url = format!("{}/old", mock_server.uri());
    let result = fetcher.fetch_page(&url, TIMEOUT).await.unwrap();

    assert_eq!(result.status_code, 200);
    assert_eq!(result.url, url);
    assert_eq!(result.final_url, format!("{}/new", mock_server.uri()));
}

#[tokio::test]
async fn test_fetch_page_non_html_body_still_parses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"not": "html"}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_page(&format!("{}/data.json", mock_server.uri()), TIMEOUT)
        .await
        .unwrap();

    let document = result.document();
    let selector = scraper::Selector::parse("a").unwrap();
    assert_eq!(document.select(&selector).count(), 0);
}

#[tokio::test]
async fn test_fetch_page_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(2000)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_page(
            &format!("{}/slow", mock_server.uri()),
            Duration::from_millis(200),
        )
        .await;

    assert!(matches!(result, Err(CrawlError::Timeout { .. })));
}

#[tokio::test]
async fn test_fetch_page_connection_refused() {
    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_page("http://127.0.0.1:9/", Duration::from_secs(2))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_fetch_url_returns_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/alive"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let status = fetcher
        .fetch_url(&format!("{}/alive", mock_server.uri()), TIMEOUT)
        .await;

    assert_eq!(status, 204);
}

#[tokio::test]
async fn test_fetch_url_sends_no_accept_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/plain"))
        .and(header("user-agent", USER_AGENT))
        .and(without_accept_encoding)
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let status = fetcher
        .fetch_url(&format!("{}/plain", mock_server.uri()), TIMEOUT)
        .await;

    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_redirect_trace_sends_no_accept_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/from"))
        .and(without_accept_encoding)
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/to"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/to"))
        .and(without_accept_encoding)
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_url_with_redirects(&format!("{}/from", mock_server.uri()), TIMEOUT, 5)
        .await;

    assert_eq!(result.status_code, 200);
    assert_eq!(result.redirect_count, 1);
}

#[tokio::test]
async fn test_fetch_url_unreachable_returns_zero() {
    let fetcher = Fetcher::new().unwrap();
    let status = fetcher
        .fetch_url("http://127.0.0.1:9/", Duration::from_secs(2))
        .await;

    assert_eq!(status, STATUS_UNREACHABLE);
}

#[tokio::test]
async fn test_fetch_url_timeout_returns_zero() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(2000)))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let status = fetcher
        .fetch_url(&mock_server.uri(), Duration::from_millis(200))
        .await;

    assert_eq!(status, 0);
}

#[tokio::test]
async fn test_redirect_chain_is_traced() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/b"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/c", base).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_url_with_redirects(&format!("{}/a", base), TIMEOUT, 5)
        .await;

    assert_eq!(result.status_code, 200);
    assert_eq!(result.redirect_count, 2);
    assert_eq!(result.final_url, format!("{}/c", base));
    assert_eq!(
        result.chain,
        vec![
            format!("{}/a", base),
            format!("{}/b", base),
            format!("{}/c", base)
        ]
    );
}

#[tokio::test]
async fn test_redirect_loop_reports_zero() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/loop1"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop2"))
        .mount(&mock_server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/loop2"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop1"))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_url_with_redirects(&format!("{}/loop1", base), TIMEOUT, 3)
        .await;

    assert_eq!(result.status_code, STATUS_UNREACHABLE);
    assert_eq!(result.redirect_count, 3);
    // Start plus three followed hops
    assert_eq!(result.chain.len(), 4);
    assert_eq!(result.chain[0], format!("{}/loop1", base));
    assert_eq!(result.chain[1], format!("{}/loop2", base));
}

#[tokio::test]
async fn test_redirect_without_location_is_final() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/odd"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&mock_server)
        .await;

    let fetcher = Fetcher::new().unwrap();
    let result = fetcher
        .fetch_url_with_redirects(&format!("{}/odd", mock_server.uri()), TIMEOUT, 5)
        .await;

    assert_eq!(result.status_code, 302);
    assert_eq!(result.redirect_count, 0);
    assert_eq!(result.chain.len(), 1);
}
