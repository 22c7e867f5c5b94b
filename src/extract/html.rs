//! Pure HTML/text extraction of upload-path image URLs.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

/// Path fragment every kept image URL must contain.
pub const UPLOAD_PATH_MARKER: &str = "wp-content/uploads";

/// `<img>` attributes consulted in priority order.
const IMG_SOURCE_ATTRS: [&str; 3] = ["src", "data-src", "data-lazy-src"];

/// Absolute upload-path image URLs anywhere in the page text.
#[allow(clippy::expect_used)]
static UPLOAD_IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https?://[^\s'"<>()]+wp-content/uploads[^\s'"<>()]*\.(?i:jpe?g|png|gif|webp)\b"#,
    )
    .expect("upload image regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector is valid"));

/// Extracts upload-path image URLs from `html` fetched from `page_url`.
///
/// Tag-derived URLs come first, then text-scan matches not already seen.
/// Both are normalized by the URL parser (lower-case host, percent-encoded
/// path) before comparison, so the same image found both ways appears once,
/// at its first position.
#[must_use]
pub fn extract_image_urls(html: &str, page_url: &str) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for reference in img_references(html) {
        let Some(resolved) = resolve(base.as_ref(), &reference) else {
            trace!(reference = %reference, "unresolvable image reference dropped");
            continue;
        };
        if seen.insert(resolved.clone()) {
            images.push(resolved);
        }
    }

    for found in UPLOAD_IMAGE_PATTERN.find_iter(html) {
        let Some(normalized) = resolve(None, found.as_str()) else {
            trace!(found = found.as_str(), "unparseable scanned URL dropped");
            continue;
        };
        if seen.insert(normalized.clone()) {
            images.push(normalized);
        }
    }

    images.retain(|url| url.contains(UPLOAD_PATH_MARKER));
    images
}

fn img_references(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&IMG_SELECTOR)
        .filter_map(|element| {
            let value = element.value();
            IMG_SOURCE_ATTRS
                .iter()
                .filter_map(|attr| value.attr(attr))
                .map(str::trim)
                .find(|candidate| !candidate.is_empty())
                .map(str::to_string)
        })
        .collect()
}

fn resolve(base: Option<&Url>, reference: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(reference).ok()?,
        None => Url::parse(reference).ok()?,
    };
    Some(resolved.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PAGE: &str = "https://example.com/2024/01/post/";

    #[test]
    fn test_img_src_relative_and_absolute() {
        let html = r#"
            <img src="/wp-content/uploads/2024/01/a.jpg">
            <img src="https://cdn.example.com/wp-content/uploads/b.png">
        "#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec![
                "https://example.com/wp-content/uploads/2024/01/a.jpg",
                "https://cdn.example.com/wp-content/uploads/b.png",
            ]
        );
    }

    #[test]
    fn test_lazy_attributes_in_priority_order() {
        let html = r#"
            <img src="" data-src="/wp-content/uploads/lazy1.jpg">
            <img src="  " data-lazy-src="/wp-content/uploads/lazy2.jpg">
            <img src="/wp-content/uploads/first.jpg" data-src="/wp-content/uploads/ignored.jpg">
        "#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec![
                "https://example.com/wp-content/uploads/lazy1.jpg",
                "https://example.com/wp-content/uploads/lazy2.jpg",
                "https://example.com/wp-content/uploads/first.jpg",
            ]
        );
    }

    #[test]
    fn test_img_without_any_source_is_ignored() {
        let html = r#"<img alt="nothing"><img src="/wp-content/uploads/a.gif">"#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec!["https://example.com/wp-content/uploads/a.gif"]
        );
    }

    #[test]
    fn test_text_scan_appends_after_tags() {
        let html = r#"
            <script>var bg = "https://example.com/wp-content/uploads/bg.webp";</script>
            <img src="/wp-content/uploads/a.jpg">
        "#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec![
                "https://example.com/wp-content/uploads/a.jpg",
                "https://example.com/wp-content/uploads/bg.webp",
            ]
        );
    }

    #[test]
    fn test_duplicates_keep_tag_position() {
        let html = r#"
            <img src="https://example.com/wp-content/uploads/a.jpg">
            <img src="/wp-content/uploads/b.jpg">
            <img src="/wp-content/uploads/a.jpg">
        "#;
        let urls = extract_image_urls(html, PAGE);
        assert_eq!(
            urls,
            vec![
                "https://example.com/wp-content/uploads/a.jpg",
                "https://example.com/wp-content/uploads/b.jpg",
            ]
        );
    }

    #[test]
    fn test_same_image_from_tag_and_scan_appears_once() {
        let html = r#"
            <img src="https://Example.com/wp-content/uploads/ภาพ.jpg">
            <script>var hero = "https://example.com/wp-content/uploads/ภาพ.jpg";</script>
            <img src="/wp-content/uploads/b.jpg">
            <script>var alt = "https://EXAMPLE.com/wp-content/uploads/b.jpg";</script>
        "#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec![
                "https://example.com/wp-content/uploads/%E0%B8%A0%E0%B8%B2%E0%B8%9E.jpg",
                "https://example.com/wp-content/uploads/b.jpg",
            ]
        );
    }

    #[test]
    fn test_non_upload_images_dropped() {
        let html = r#"
            <img src="/wp-content/themes/site/logo.png">
            <img src="https://gravatar.com/avatar/abc.jpg">
            <img src="/wp-content/uploads/keep.png">
        "#;
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec!["https://example.com/wp-content/uploads/keep.png"]
        );
    }

    #[test]
    fn test_text_scan_extension_case_insensitive_and_query_trimmed() {
        let html = "url(https://example.com/wp-content/uploads/hero.JPG?ver=3)";
        assert_eq!(
            extract_image_urls(html, PAGE),
            vec!["https://example.com/wp-content/uploads/hero.JPG"]
        );
    }

    #[test]
    fn test_text_scan_ignores_other_extensions() {
        let html = r#""https://example.com/wp-content/uploads/doc.pdf""#;
        assert!(extract_image_urls(html, PAGE).is_empty());
    }

    #[test]
    fn test_unparseable_page_url_keeps_absolute_references() {
        let html = r#"
            <img src="/wp-content/uploads/relative.jpg">
            <img src="https://example.com/wp-content/uploads/absolute.jpg">
        "#;
        assert_eq!(
            extract_image_urls(html, "not a url"),
            vec!["https://example.com/wp-content/uploads/absolute.jpg"]
        );
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_image_urls("", PAGE).is_empty());
    }
}
