//! HTML parser for extracting links and page signals
//!
//! This module turns a fetched page body into structured data:
//! - Links, split into valid, invalid and special-protocol buckets
//! - Images, figures, inline SVGs and `<picture>` groups
//! - The page title
//!
//! Every extractor is independent and side-effect free.

use crate::url::is_same_host;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

/// Maximum length (in characters) of stored anchor and caption text
pub const MAX_TEXT_LENGTH: usize = 200;

/// Maximum length (in characters) of an inline SVG source snippet
pub const SVG_SNIPPET_LENGTH: usize = 100;

/// A followable link found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLink {
    /// Absolute URL, resolved against the page URL
    pub href: String,

    /// Anchor text, whitespace-collapsed and truncated
    pub text: String,

    /// True if the link's host is exactly the page's host
    pub is_internal: bool,

    /// True if `rel` contains `nofollow`
    pub is_nofollow: bool,
}

/// Why an anchor could not be turned into a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidLinkReason {
    /// `href` is empty or just `#`
    Empty,
    /// `href` uses the `javascript:` scheme
    Javascript,
    /// `href` cannot be resolved to a URL
    Malformed,
}

impl InvalidLinkReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Javascript => "javascript",
            Self::Malformed => "malformed",
        }
    }
}

/// An anchor whose `href` is unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidLink {
    pub href: String,
    pub reason: InvalidLinkReason,
    pub text: String,
}

/// Special-protocol link types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialLinkKind {
    Tel,
    Mailto,
}

/// A `tel:` or `mailto:` link with a lightweight format check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialLink {
    #[serde(rename = "type")]
    pub kind: SpecialLinkKind,
    pub href: String,
    /// The phone number or address after the scheme
    pub value: String,
    pub text: String,
    pub is_valid: bool,
    pub issue: Option<String>,
}

/// An `<img>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedImage {
    /// Image source, absolute when it could be resolved
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub srcset: Option<String>,
    pub is_lazy_loaded: bool,
}

/// A `<figure>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFigure {
    pub has_caption: bool,
    pub image_count: usize,
    pub caption_text: Option<String>,
}

/// An inline `<svg>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineSvg {
    /// Size of the element's serialized markup in bytes
    pub byte_size: usize,
    pub has_viewbox: bool,
    pub has_title: bool,
    pub snippet: String,
}

/// A `<source>` inside a `<picture>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureSource {
    pub srcset: Option<String>,
    pub media: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
}

/// A `<picture>` responsive-image group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureElement {
    pub sources: Vec<PictureSource>,
    pub has_img_fallback: bool,
    pub fallback_src: Option<String>,
}

/// Links found on a page, sorted into buckets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSet {
    pub links: Vec<ExtractedLink>,
    pub invalid: Vec<InvalidLink>,
    pub special: Vec<SpecialLink>,
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageContent {
    pub title: Option<String>,
    pub links: Vec<ExtractedLink>,
    pub invalid_links: Vec<InvalidLink>,
    pub special_links: Vec<SpecialLink>,
    pub images: Vec<ExtractedImage>,
    pub figures: Vec<ExtractedFigure>,
    pub svgs: Vec<InlineSvg>,
    pub pictures: Vec<PictureElement>,
}

impl PageContent {
    /// Links that point at the page's own host
    pub fn internal_links(&self) -> impl Iterator<Item = &ExtractedLink> {
        self.links.iter().filter(|l| l.is_internal)
    }

    /// Links that point elsewhere
    pub fn external_links(&self) -> impl Iterator<Item = &ExtractedLink> {
        self.links.iter().filter(|l| !l.is_internal)
    }
}

/// Parses an HTML page and runs every extractor over it
///
/// # Arguments
///
/// * `html` - The page body
/// * `base_url` - The page URL, used to resolve relative references and to
///   decide which links are internal
///
/// # Example
///
/// ```
/// use seomator_crawler::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract_page(html, &base_url);
/// assert_eq!(page.title, Some("Test".to_string()));
/// assert_eq!(page.links[0].href, "https://example.com/page");
/// assert!(page.links[0].is_internal);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> PageContent {
    let document = Html::parse_document(html);
    let link_set = extract_links(&document, base_url);

    PageContent {
        title: extract_title(&document),
        links: link_set.links,
        invalid_links: link_set.invalid,
        special_links: link_set.special,
        images: extract_images(&document, base_url),
        figures: extract_figures(&document),
        svgs: extract_svgs(&document),
        pictures: extract_pictures(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts and classifies every `<a href>` in the document
///
/// # Classification Rules
///
/// | `href` | Bucket |
/// |--------|--------|
/// | empty or `#` | invalid, `empty` |
/// | `javascript:...` | invalid, `javascript` |
/// | `tel:...` / `mailto:...` | special |
/// | `data:...` | skipped |
/// | unresolvable | invalid, `malformed` |
/// | anything else | valid, resolved against `base_url` |
pub fn extract_links(document: &Html, base_url: &Url) -> LinkSet {
    let mut set = LinkSet::default();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return set;
    };

    let page_host = base_url.host_str().unwrap_or("");

    for element in document.select(&a_selector) {
        let raw_href = element.value().attr("href").unwrap_or("");
        let href = raw_href.trim();
        let text = element_text(&element);
        let lower = href.to_ascii_lowercase();

        if href.is_empty() || href == "#" {
            set.invalid.push(InvalidLink {
                href: raw_href.to_string(),
                reason: InvalidLinkReason::Empty,
                text,
            });
            continue;
        }

        if lower.starts_with("javascript:") {
            set.invalid.push(InvalidLink {
                href: href.to_string(),
                reason: InvalidLinkReason::Javascript,
                text,
            });
            continue;
        }

        if lower.starts_with("tel:") {
            set.special.push(tel_link(href, text));
            continue;
        }

        if lower.starts_with("mailto:") {
            set.special.push(mailto_link(href, text));
            continue;
        }

        if lower.starts_with("data:") {
            tracing::trace!("Skipping data: link on {}", base_url);
            continue;
        }

        match base_url.join(href) {
            Ok(absolute) => {
                let is_internal = !page_host.is_empty() && is_same_host(&absolute, page_host);
                let is_nofollow = element
                    .value()
                    .attr("rel")
                    .map(|rel| rel.to_ascii_lowercase().contains("nofollow"))
                    .unwrap_or(false);

                set.links.push(ExtractedLink {
                    href: absolute.to_string(),
                    text,
                    is_internal,
                    is_nofollow,
                });
            }
            Err(e) => {
                tracing::trace!("Malformed href '{}' on {}: {}", href, base_url, e);
                set.invalid.push(InvalidLink {
                    href: href.to_string(),
                    reason: InvalidLinkReason::Malformed,
                    text,
                });
            }
        }
    }

    set
}

/// Extracts every `<img>` with a usable source
///
/// The source prefers `src` and falls back to `data-src`. Images with an
/// empty or `data:` source are skipped entirely.
pub fn extract_images(document: &Html, base_url: &Url) -> Vec<ExtractedImage> {
    let Ok(img_selector) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&img_selector)
        .filter_map(|element| {
            let el = element.value();
            let data_src = non_empty_attr(&element, "data-src");
            let src = non_empty_attr(&element, "src").or(data_src)?;

            if src.to_ascii_lowercase().starts_with("data:") {
                return None;
            }

            let is_lazy_loaded = el
                .attr("loading")
                .map(|v| v.trim().eq_ignore_ascii_case("lazy"))
                .unwrap_or(false)
                || el.attr("data-src").is_some();

            Some(ExtractedImage {
                src: resolve_or_raw(base_url, src),
                alt: el.attr("alt").map(str::to_string),
                width: el.attr("width").map(str::to_string),
                height: el.attr("height").map(str::to_string),
                srcset: el.attr("srcset").map(str::to_string),
                is_lazy_loaded,
            })
        })
        .collect()
}

/// Extracts every `<figure>` with its caption and image count
pub fn extract_figures(document: &Html) -> Vec<ExtractedFigure> {
    let (Ok(figure_selector), Ok(caption_selector), Ok(img_selector)) = (
        Selector::parse("figure"),
        Selector::parse("figcaption"),
        Selector::parse("img"),
    ) else {
        return Vec::new();
    };

    document
        .select(&figure_selector)
        .map(|figure| {
            let caption = figure.select(&caption_selector).next();
            ExtractedFigure {
                has_caption: caption.is_some(),
                image_count: figure.select(&img_selector).count(),
                caption_text: caption
                    .map(|c| element_text(&c))
                    .filter(|t| !t.is_empty()),
            }
        })
        .collect()
}

/// Extracts every inline `<svg>`
pub fn extract_svgs(document: &Html) -> Vec<InlineSvg> {
    let (Ok(svg_selector), Ok(title_selector)) =
        (Selector::parse("svg"), Selector::parse("title"))
    else {
        return Vec::new();
    };

    document
        .select(&svg_selector)
        .map(|svg| {
            let markup = svg.html();
            let el = svg.value();
            InlineSvg {
                byte_size: markup.len(),
                has_viewbox: el.attr("viewBox").or_else(|| el.attr("viewbox")).is_some(),
                has_title: svg.select(&title_selector).next().is_some(),
                snippet: truncate_chars(&markup, SVG_SNIPPET_LENGTH),
            }
        })
        .collect()
}

/// Extracts every `<picture>` with its sources and fallback image
pub fn extract_pictures(document: &Html, base_url: &Url) -> Vec<PictureElement> {
    let (Ok(picture_selector), Ok(source_selector), Ok(img_selector)) = (
        Selector::parse("picture"),
        Selector::parse("source"),
        Selector::parse("img"),
    ) else {
        return Vec::new();
    };

    document
        .select(&picture_selector)
        .map(|picture| {
            let sources = picture
                .select(&source_selector)
                .map(|source| {
                    let el = source.value();
                    PictureSource {
                        srcset: el.attr("srcset").map(str::to_string),
                        media: el.attr("media").map(str::to_string),
                        source_type: el.attr("type").map(str::to_string),
                    }
                })
                .collect();

            let fallback = picture.select(&img_selector).next();
            PictureElement {
                sources,
                has_img_fallback: fallback.is_some(),
                fallback_src: fallback
                    .and_then(|img| non_empty_attr(&img, "src"))
                    .map(|src| resolve_or_raw(base_url, src)),
            }
        })
        .collect()
}

fn tel_link(href: &str, text: String) -> SpecialLink {
    let value = href[4..].trim().to_string();
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();

    let issue = if value.is_empty() {
        Some("Empty phone number".to_string())
    } else if !(7..=15).contains(&digits) {
        Some(format!(
            "Phone number has {} digits; expected 7-15 (E.164)",
            digits
        ))
    } else if value
        .chars()
        .any(|c| !(c.is_ascii_digit() || "+-(). ".contains(c)))
    {
        Some("Phone number contains invalid characters".to_string())
    } else {
        None
    };

    SpecialLink {
        kind: SpecialLinkKind::Tel,
        href: href.to_string(),
        value,
        text,
        is_valid: issue.is_none(),
        issue,
    }
}

fn mailto_link(href: &str, text: String) -> SpecialLink {
    let rest = &href[7..];
    let value = rest.split('?').next().unwrap_or("").trim().to_string();

    let issue = if value.is_empty() {
        Some("Empty email address".to_string())
    } else if !value.split(',').all(|addr| is_valid_email(addr.trim())) {
        Some(format!("Invalid email address: {}", value))
    } else {
        None
    };

    SpecialLink {
        kind: SpecialLinkKind::Mailto,
        href: href.to_string(),
        value,
        text,
        is_valid: issue.is_none(),
        issue,
    }
}

/// Checks for a `local@domain.tld` shape
fn is_valid_email(address: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .map(|re| re.is_match(address))
        .unwrap_or(false)
}

fn element_text(element: &ElementRef) -> String {
    let text = collapse_whitespace(&element.text().collect::<String>());
    truncate_chars(&text, MAX_TEXT_LENGTH)
}

fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn resolve_or_raw(base_url: &Url, reference: &str) -> String {
    base_url
        .join(reference)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| reference.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
