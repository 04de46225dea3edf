use crate::url::glob::GlobPattern;
use std::collections::HashSet;
use url::Url;

/// Query parameter prefixes dropped during normalization by default
pub const DEFAULT_DROPPED_QUERY_PARAM_PREFIXES: &[&str] = &["utm_", "gclid", "fbclid"];

/// Options controlling which URLs a crawl follows and how they are normalized
#[derive(Debug, Clone)]
pub struct UrlFilterOptions {
    /// Glob patterns a path must match at least one of (empty = allow all)
    pub include_patterns: Vec<String>,

    /// Glob patterns that exclude a path
    pub exclude_patterns: Vec<String>,

    /// When non-empty, only these query parameters survive normalization
    pub allowed_query_params: HashSet<String>,

    /// Query parameters starting with any of these (case-insensitive) are dropped
    pub dropped_query_param_prefixes: Vec<String>,
}

impl Default for UrlFilterOptions {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            allowed_query_params: HashSet::new(),
            dropped_query_param_prefixes: DEFAULT_DROPPED_QUERY_PARAM_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// URL normalizer and include/exclude filter
///
/// All glob patterns are compiled once at construction. The filter is
/// immutable afterwards and can be shared between crawl workers.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    include: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
    allowed_query_params: HashSet<String>,
    dropped_prefixes: Vec<String>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(UrlFilterOptions::default())
    }
}

impl UrlFilter {
    /// Creates a new filter, compiling every include and exclude pattern
    pub fn new(options: UrlFilterOptions) -> Self {
        Self {
            include: compile_all(&options.include_patterns),
            exclude: compile_all(&options.exclude_patterns),
            allowed_query_params: options.allowed_query_params,
            dropped_prefixes: options
                .dropped_query_param_prefixes
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Decides whether a URL (or bare path) passes the include/exclude rules
    ///
    /// With no patterns configured every input is allowed. Include patterns,
    /// when present, must match; exclude patterns always win.
    ///
    /// # Examples
    ///
    /// ```
    /// use seomator_crawler::url::{UrlFilter, UrlFilterOptions};
    ///
    /// let filter = UrlFilter::new(UrlFilterOptions {
    ///     exclude_patterns: vec!["/admin/**".to_string()],
    ///     ..Default::default()
    /// });
    /// assert!(!filter.should_crawl("https://example.com/admin/users"));
    /// assert!(filter.should_crawl("/blog"));
    /// ```
    pub fn should_crawl(&self, url_or_path: &str) -> bool {
        let path = resolve_path(url_or_path);

        if !self.include.is_empty() && !self.include.iter().any(|g| g.test(&path)) {
            return false;
        }

        if self.exclude.iter().any(|g| g.test(&path)) {
            return false;
        }

        true
    }

    /// Normalizes a URL for deduplication
    ///
    /// # Normalization Steps
    ///
    /// 1. Parse the URL; unparseable input is returned unchanged
    /// 2. Remove the fragment
    /// 3. Filter query parameters: with an allow-list only listed names
    ///    survive, otherwise names matching a drop prefix are removed
    /// 4. Sort the remaining parameters by name
    /// 5. Remove trailing slashes from the path, except for the root `/`
    ///
    /// # Examples
    ///
    /// ```
    /// use seomator_crawler::url::UrlFilter;
    ///
    /// let filter = UrlFilter::default();
    /// assert_eq!(
    ///     filter.normalize_url("https://example.com/page/?utm_source=x&id=1#top"),
    ///     "https://example.com/page?id=1"
    /// );
    /// ```
    pub fn normalize_url(&self, url_str: &str) -> String {
        let mut url = match Url::parse(url_str) {
            Ok(url) => url,
            Err(_) => return url_str.to_string(),
        };

        url.set_fragment(None);

        if url.query().is_some() {
            let mut params: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(name, _)| self.keeps_query_param(name))
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();

            // Stable sort: repeated names keep their original relative order
            params.sort_by(|a, b| a.0.cmp(&b.0));

            if params.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(params);
            }
        }

        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = path.trim_end_matches('/');
            let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
            let trimmed = trimmed.to_string();
            url.set_path(&trimmed);
        }

        url.to_string()
    }

    /// Tests a URL (or bare path) against a single, freshly compiled pattern
    pub fn matches_pattern(url_or_path: &str, pattern: &str) -> bool {
        GlobPattern::compile(pattern).test(&resolve_path(url_or_path))
    }

    fn keeps_query_param(&self, name: &str) -> bool {
        if !self.allowed_query_params.is_empty() {
            return self.allowed_query_params.contains(name);
        }

        let lower = name.to_ascii_lowercase();
        !self
            .dropped_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }
}

fn compile_all(patterns: &[String]) -> Vec<GlobPattern> {
    patterns.iter().map(|p| GlobPattern::compile(p)).collect()
}

/// Resolves an absolute URL to its path, or treats the input as a path
fn resolve_path(url_or_path: &str) -> String {
    match Url::parse(url_or_path) {
        Ok(url) => url.path().to_string(),
        Err(_) if url_or_path.starts_with('/') => url_or_path.to_string(),
        Err(_) => format!("/{}", url_or_path),
    }
}
