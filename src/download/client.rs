//! HTTP client wrapper for page and image fetches.
//!
//! This module provides the `HttpClient` struct which applies the page/image
//! timeout split, sends browser-like request headers, and streams image bodies
//! to disk with cleanup on error.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, IMAGE_TIMEOUT_SECS, PAGE_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Timeouts applied to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// TCP/TLS connect timeout, shared by every request.
    pub connect: Duration,
    /// Whole-request timeout for HTML page fetches.
    pub page: Duration,
    /// Whole-request timeout for image fetches, body included.
    pub image: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            page: Duration::from_secs(PAGE_TIMEOUT_SECS),
            image: Duration::from_secs(IMAGE_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for page fetches and streamed image downloads.
///
/// Create once per run and share; clones reuse the same connection pool.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::{HttpClient, HttpTimeouts};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(HttpTimeouts::default())?;
/// let html = client.fetch_text("https://example.com/gallery/").await?;
/// println!("fetched {} bytes", html.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeouts: HttpTimeouts,
}

impl HttpClient {
    /// Creates a client with the given timeouts and the browser `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the TLS backend or system
    /// configuration cannot be initialized.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .gzip(true)
            .user_agent(user_agent::BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client, timeouts })
    }

    /// Returns the configured timeouts.
    #[must_use]
    pub fn timeouts(&self) -> HttpTimeouts {
        self.timeouts
    }

    /// Fetches a page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HttpStatus`] for non-2xx responses and
    /// [`DownloadError::Network`]/[`DownloadError::Timeout`] for transport
    /// failures, including body read errors.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeouts.page)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Issues the GET for an image and returns the response once headers
    /// arrive with a success status.
    ///
    /// The image timeout covers the whole exchange, so a slow body read
    /// during [`stream_to_file`] still times out.
    ///
    /// # Errors
    ///
    /// Same classes as [`fetch_text`](Self::fetch_text).
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get_image(
        &self,
        url: &str,
        referer: &str,
    ) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeouts.image)
            .header(ACCEPT, user_agent::IMAGE_ACCEPT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(REFERER, referer)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "image request rejected");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

/// Returns the response's `Content-Type` header value, lower-cased.
pub(crate) fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_ascii_lowercase)
}

/// Streams a response body into a new file at `file_path`, returning bytes
/// written.
///
/// On any failure the partially written file is removed before the error is
/// returned.
pub(crate) async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    let result = write_body(file, response, url, file_path).await;
    if result.is_err() {
        debug!(path = %file_path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(file_path).await;
    }
    result
}

async fn write_body(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
