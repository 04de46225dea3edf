use url::Url;

/// File extensions that never lead to crawlable HTML pages
const NON_HTML_EXTENSIONS: &[&str] = &[
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".rtf", ".txt",
    ".csv",
    // Archives
    ".zip", ".rar", ".tar", ".gz", ".tgz", ".7z", ".bz2",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".avif", ".ico", ".bmp", ".tiff",
    // Audio and video
    ".mp3", ".mp4", ".wav", ".ogg", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4a", ".mkv",
    // Assets
    ".css", ".js", ".mjs", ".json", ".xml", ".woff", ".woff2", ".ttf", ".otf", ".eot", ".map",
    // Binaries
    ".exe", ".dmg", ".msi", ".apk", ".iso", ".bin",
];

/// Extracts the host from a URL
///
/// The `url` crate already lowercases hosts of special schemes, so the
/// returned string can be compared directly.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seomator_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if the URL's host is exactly `host`
///
/// Subdomains are distinct hosts: `blog.example.com` is not `example.com`.
pub fn is_same_host(url: &Url, host: &str) -> bool {
    url.host_str()
        .map(|h| h.eq_ignore_ascii_case(host))
        .unwrap_or(false)
}

/// Returns true if the path ends in a known non-HTML file extension
pub fn has_non_html_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    NON_HTML_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
