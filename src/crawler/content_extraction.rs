//! Content extraction functionality for the crawler module
//!
//! Every function here works on an already parsed [`Html`] document and is
//! synchronous. `scraper::Html` is not `Send`, so callers parse and extract in
//! one go and only hand owned results across `.await` points.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::{Origin, Url};

use crate::crawler::error::CrawlError;
use crate::crawler::urls::{normalize_url, parse_valid_url};
use crate::crawler::{ImageRef, PageMetadata};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Everything the crawler keeps from one page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// Visible text, whitespace collapsed
    pub content: String,

    /// Normalized same-origin links in document order, deduplicated
    pub links: Vec<String>,

    /// Images with absolute sources
    pub images: Vec<ImageRef>,

    /// Title, description, headings and page statistics
    pub metadata: PageMetadata,
}

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css)
        .map_err(|e| CrawlError::HtmlParse(format!("Failed to parse selector '{}': {}", css, e)))
}

/// Parse `html` and run every extractor over it
///
/// # Arguments
///
/// * `html` - The raw HTML of the page
/// * `page_url` - The URL the page was fetched from, used to resolve relative references
/// * `origin` - The crawl's origin; links outside it are dropped
/// * `exclude_tags` - Tags whose subtrees do not contribute text
/// * `depth` - Crawl depth the page was found at
pub fn extract_page(
    html: &str,
    page_url: &Url,
    origin: &Origin,
    exclude_tags: &[String],
    depth: u32,
) -> Result<ExtractedPage, CrawlError> {
    let document = Html::parse_document(html);

    let content = extract_text(&document, exclude_tags);
    let links = extract_links(&document, page_url, origin)?;
    let images = extract_images(&document, page_url)?;

    let mut metadata = extract_metadata(&document)?;
    metadata.depth = depth;
    metadata.html_length = html.chars().count();
    metadata.image_count = images.len();

    Ok(ExtractedPage {
        content,
        links,
        images,
        metadata,
    })
}

/// Visible text of the document with excluded subtrees removed
///
/// Text nodes are joined with single spaces, runs of whitespace collapse to
/// one space and the result is trimmed.
pub fn extract_text(document: &Html, exclude_tags: &[String]) -> String {
    let excluded = |name: &str| exclude_tags.iter().any(|tag| tag.eq_ignore_ascii_case(name));

    let mut pieces = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let inside_excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| excluded(element.name()))
        });
        if !inside_excluded {
            pieces.push(&**text);
        }
    }

    collapse_whitespace(&pieces.join(" "))
}

/// Absolute, normalized, same-origin links of the document
pub fn extract_links(
    document: &Html,
    page_url: &Url,
    origin: &Origin,
) -> Result<Vec<String>, CrawlError> {
    let anchors = selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href.trim()) else {
            continue;
        };
        let Some(valid) = parse_valid_url(resolved.as_str()) else {
            continue;
        };
        if &valid.origin() != origin {
            continue;
        }

        let normalized = normalize_url(&valid);
        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    Ok(links)
}

/// `<img>` references with absolute sources
///
/// Images with an empty source, a data URI, or a source that does not resolve
/// to a valid http(s) URL are dropped. Other attributes are kept verbatim.
pub fn extract_images(document: &Html, page_url: &Url) -> Result<Vec<ImageRef>, CrawlError> {
    let img = selector("img")?;

    let mut images = Vec::new();
    for element in document.select(&img) {
        let src = element.value().attr("src").unwrap_or_default().trim();
        if src.is_empty() {
            continue;
        }
        let Ok(resolved) = page_url.join(src) else {
            continue;
        };
        if resolved.scheme() == "data" {
            continue;
        }
        let Some(valid) = parse_valid_url(resolved.as_str()) else {
            continue;
        };

        images.push(ImageRef {
            src: valid.to_string(),
            alt: attr(&element, "alt"),
            width: attr(&element, "width"),
            height: attr(&element, "height"),
            title: attr(&element, "title"),
        });
    }

    Ok(images)
}

/// Title, meta description and per-level heading lists
///
/// The statistics fields (`depth`, `html_length`, `image_count`) are left at
/// zero for the caller to fill in.
pub fn extract_metadata(document: &Html) -> Result<PageMetadata, CrawlError> {
    let mut metadata = PageMetadata::default();

    let title = selector("title")?;
    metadata.title = document
        .select(&title)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string());

    let description = selector("meta[name='description']")?;
    metadata.description = document
        .select(&description)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string);

    for level in 1..=6u8 {
        let heading = selector(&format!("h{}", level))?;
        let texts: Vec<String> = document
            .select(&heading)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect();
        if !texts.is_empty() {
            metadata
                .headings
                .insert(PageMetadata::heading_key(level), texts.join(", "));
        }
    }

    Ok(metadata)
}

fn attr(element: &ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title> Acme Widgets </title>
    <meta name="description" content="Widgets for everyone">
    <style>body { color: red; }</style>
</head>
<body>
    <header><h1>Site Header</h1></header>
    <nav><a href="/nav-link">Nav</a></nav>
    <main>
        <h1>Welcome</h1>
        <p>We   build
           widgets.</p>
        <h2>Pricing</h2>
        <h2>FAQ</h2>
        <a href="/about/#team">About</a>
        <a href="products?id=7">Products</a>
        <a href="https://other.example.org/page">Elsewhere</a>
        <a href="https://blog.example.com/">Blog</a>
        <a href="mailto:sales@example.com">Mail</a>
        <a href="/about">About again</a>
        <img src="/img/logo.png" alt="Company logo" width="120" height="40" title="Logo">
        <img src="data:image/png;base64,AAAA" alt="inline">
        <img src="" alt="empty">
        <img alt="missing">
        <img src="https://cdn.example.net/banner.jpg" alt="Spring banner">
    </main>
    <script>var tracking = "should not appear";</script>
    <footer>Copyright Acme</footer>
</body>
</html>"#;

    fn page_url() -> Url {
        Url::parse("https://example.com/docs/index").unwrap()
    }

    fn default_excludes() -> Vec<String> {
        ["script", "style", "header", "footer", "nav"]
            .iter()
            .map(|tag| tag.to_string())
            .collect()
    }

    #[test]
    fn test_extract_text_drops_excluded_subtrees() {
        let document = Html::parse_document(PAGE);
        let text = extract_text(&document, &default_excludes());

        assert!(text.contains("Welcome"));
        assert!(text.contains("We build widgets."));
        assert!(!text.contains("Site Header"));
        assert!(!text.contains("Nav"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("  "));
        assert_eq!(text, text.trim());
    }

    #[test]
    fn test_extract_links_same_origin_only() {
        let document = Html::parse_document(PAGE);
        let url = page_url();
        let links = extract_links(&document, &url, &url.origin()).unwrap();

        assert_eq!(
            links,
            vec![
                "https://example.com/nav-link".to_string(),
                "https://example.com/about".to_string(),
                "https://example.com/docs/products?id=7".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_images() {
        let document = Html::parse_document(PAGE);
        let images = extract_images(&document, &page_url()).unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].src, "https://example.com/img/logo.png");
        assert_eq!(images[0].alt, "Company logo");
        assert_eq!(images[0].width, "120");
        assert_eq!(images[0].height, "40");
        assert_eq!(images[0].title, "Logo");
        assert_eq!(images[1].src, "https://cdn.example.net/banner.jpg");
        assert_eq!(images[1].width, "");
    }

    #[test]
    fn test_extract_metadata() {
        let document = Html::parse_document(PAGE);
        let metadata = extract_metadata(&document).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Acme Widgets"));
        assert_eq!(metadata.description.as_deref(), Some("Widgets for everyone"));
        assert_eq!(metadata.headings(1), Some("Site Header, Welcome"));
        assert_eq!(metadata.headings(2), Some("Pricing, FAQ"));
        assert_eq!(metadata.headings(3), None);
    }

    #[test]
    fn test_extract_page_fills_statistics() {
        let url = page_url();
        let page = extract_page(PAGE, &url, &url.origin(), &default_excludes(), 1).unwrap();

        assert_eq!(page.metadata.depth, 1);
        assert_eq!(page.metadata.html_length, PAGE.chars().count());
        assert_eq!(page.metadata.image_count, 2);
        assert_eq!(page.images.len(), 2);
    }
}
