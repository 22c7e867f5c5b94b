//! Image discovery on crawled pages.
//!
//! A page is fetched once and searched two ways:
//! 1. `<img>` elements, taking the first non-empty of `src`, `data-src` and
//!    `data-lazy-src`, resolved against the page URL
//! 2. A text scan of the raw page for absolute upload-path image URLs
//!    (catches images referenced from scripts, styles and JSON blobs)
//!
//! Results keep first-seen order with tag-derived URLs first, and only URLs
//! under the upload path survive.
//!
//! # Example
//!
//! ```
//! use harvester_core::extract::extract_image_urls;
//!
//! let html = r#"<img src="/wp-content/uploads/a.jpg"><img src="/theme/logo.png">"#;
//! let urls = extract_image_urls(html, "https://example.com/post/");
//! assert_eq!(urls, vec!["https://example.com/wp-content/uploads/a.jpg"]);
//! ```

mod html;

pub use html::{UPLOAD_PATH_MARKER, extract_image_urls};

use tracing::{debug, instrument, warn};

use crate::download::HttpClient;

/// Fetches pages and extracts candidate image URLs from them.
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    client: HttpClient,
}

impl ImageExtractor {
    /// Creates an extractor that fetches through `client` (page timeout
    /// applies).
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetches `url` and returns the upload-path image URLs found on it.
    ///
    /// Fetch failures are logged and yield an empty list; one bad page never
    /// stops a run.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn extract_images(&self, url: &str) -> Vec<String> {
        let html = match self.client.fetch_text(url).await {
            Ok(html) => html,
            Err(error) => {
                warn!(error = %error, "page fetch failed, treating as no images");
                return Vec::new();
            }
        };

        let images = extract_image_urls(&html, url);
        debug!(found = images.len(), "images extracted");
        images
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::download::HttpTimeouts;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn extractor() -> ImageExtractor {
        ImageExtractor::new(HttpClient::new(HttpTimeouts::default()).unwrap())
    }

    #[tokio::test]
    async fn test_extract_images_resolves_against_page() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/gallery/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><img src="../wp-content/uploads/a.jpg"></body></html>"#,
            ))
            .mount(&mock_server)
            .await;

        let url = format!("{}/gallery/", mock_server.uri());
        let images = extractor().extract_images(&url).await;
        assert_eq!(
            images,
            vec![format!("{}/wp-content/uploads/a.jpg", mock_server.uri())]
        );
    }

    #[tokio::test]
    async fn test_extract_images_error_status_yields_empty() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                r#"<img src="/wp-content/uploads/a.jpg">"#,
            ))
            .mount(&mock_server)
            .await;

        let url = format!("{}/gone", mock_server.uri());
        assert!(extractor().extract_images(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_extract_images_unreachable_yields_empty() {
        // Port 9 (discard) is not expected to accept connections.
        let images = extractor().extract_images("http://127.0.0.1:9/").await;
        assert!(images.is_empty());
    }
}
