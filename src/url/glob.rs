use regex::Regex;

/// A compiled glob pattern for matching URL paths
///
/// Supported wildcards:
///
/// - `*` matches zero or more characters except `/`
/// - `**` matches zero or more characters including `/`
/// - `?` matches exactly one character
///
/// Everything else matches literally. The compiled matcher is anchored at
/// both ends, so `/admin` does not match `/admin/*`.
///
/// A pattern ending in `/**` also matches the bare base path: `/admin/**`
/// matches `/admin`, `/admin/` and `/admin/users/edit`.
///
/// Compilation never fails. Any string is a valid, if possibly over-broad,
/// pattern.
///
/// # Examples
///
/// ```
/// use seomator_crawler::url::GlobPattern;
///
/// let glob = GlobPattern::compile("/blog/*");
/// assert!(glob.test("/blog/hello"));
/// assert!(!glob.test("/blog/2024/hello"));
///
/// let glob = GlobPattern::compile("/admin/**");
/// assert!(glob.test("/admin"));
/// assert!(glob.test("/admin/users/edit"));
/// ```
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Option<Regex>,
}

impl GlobPattern {
    /// Compiles a glob pattern into an anchored matcher
    pub fn compile(pattern: &str) -> Self {
        let expression = glob_to_regex(pattern);

        let regex = match Regex::new(&expression) {
            Ok(regex) => Some(regex),
            Err(e) => {
                // Only reachable if the regex engine refuses the size of the
                // expression; fall back to literal comparison.
                tracing::warn!("Glob '{}' could not be compiled: {}", pattern, e);
                None
            }
        };

        Self {
            source: pattern.to_string(),
            regex,
        }
    }

    /// Tests a path against the pattern
    pub fn test(&self, path: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(path),
            None => self.source == path,
        }
    }

    /// Returns the pattern string this matcher was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Translates a glob pattern into an anchored regular expression
fn glob_to_regex(pattern: &str) -> String {
    let (body, trailing_globstar) = match pattern.strip_suffix("/**") {
        Some(base) => (base, true),
        None => (pattern, false),
    };

    let mut expression = String::with_capacity(pattern.len() * 2 + 8);
    expression.push_str("(?s)^");

    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                // `**` is consumed as one token so it is never read as two `*`
                if chars.peek() == Some(&'*') {
                    chars.next();
                    expression.push_str(".*");
                } else {
                    expression.push_str("[^/]*");
                }
            }
            '?' => expression.push('.'),
            other => {
                let mut buf = [0u8; 4];
                expression.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    if trailing_globstar {
        expression.push_str("(?:/.*)?");
    }

    expression.push('$');
    expression
}
