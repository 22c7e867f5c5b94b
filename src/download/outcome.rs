//! Per-call outcomes and run counters.

use std::fmt;

use serde::Serialize;

use super::ValidationError;

/// Why a URL was refused without being counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReason {
    /// Rejected by the URL validator before any request.
    Validation {
        /// Human-readable rejection.
        message: String,
    },
    /// The server answered with a non-image `Content-Type`.
    NotAnImage {
        /// The received content type, when present.
        content_type: Option<String>,
    },
}

impl From<ValidationError> for InvalidReason {
    fn from(error: ValidationError) -> Self {
        Self::Validation {
            message: error.to_string(),
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { message } => f.write_str(message),
            Self::NotAnImage {
                content_type: Some(content_type),
            } => write!(f, "not an image (content-type {content_type})"),
            Self::NotAnImage { content_type: None } => f.write_str("not an image (no content-type)"),
        }
    }
}

/// Result of one [`DownloadEngine::download`](super::DownloadEngine::download)
/// call. Callers branch on the variant; `Display` is for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The image was fetched and written.
    Downloaded {
        url: String,
        filename: String,
        bytes: u64,
    },
    /// A file with the derived name already existed; nothing was fetched.
    Skipped { url: String, filename: String },
    /// The URL or its response was rejected; not retried, not a failure.
    Invalid { url: String, reason: InvalidReason },
    /// Every allowed attempt failed; the URL is in the failure ledger.
    Failed {
        url: String,
        error: String,
        attempts: u32,
    },
}

impl DownloadOutcome {
    /// The URL this outcome is about, as passed to the engine.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Downloaded { url, .. }
            | Self::Skipped { url, .. }
            | Self::Invalid { url, .. }
            | Self::Failed { url, .. } => url,
        }
    }

    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded {
                filename, bytes, ..
            } => write!(f, "downloaded {filename} ({bytes} bytes)"),
            Self::Skipped { filename, .. } => write!(f, "skipped {filename} (already exists)"),
            Self::Invalid { url, reason } => write!(f, "invalid {url}: {reason}"),
            Self::Failed {
                url,
                error,
                attempts,
            } => write!(f, "failed {url} after {attempts} attempt(s): {error}"),
        }
    }
}

/// Counters kept by a [`DownloadEngine`](super::DownloadEngine).
///
/// All counters only grow. `total_failed` is the historical count of
/// terminal failures; the live failure count is the ledger size, reported
/// separately as `currently_failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadStats {
    downloaded: usize,
    skipped: usize,
    invalid: usize,
    total_failed: usize,
}

impl DownloadStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of images written.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Returns the number of images skipped because the file existed.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Returns the number of URLs rejected by validation or content type.
    #[must_use]
    pub fn invalid(&self) -> usize {
        self.invalid
    }

    /// Returns the historical number of terminal failures.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.total_failed
    }

    pub(crate) fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { .. } => self.downloaded += 1,
            DownloadOutcome::Skipped { .. } => self.skipped += 1,
            DownloadOutcome::Invalid { .. } => self.invalid += 1,
            DownloadOutcome::Failed { .. } => self.total_failed += 1,
        }
    }
}

/// Result of a retry pass over the failure ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetrySummary {
    /// Ledger size when the pass started.
    pub remaining: usize,
    /// Entries that downloaded this time.
    pub succeeded: usize,
    /// Entries that did not download (failed again, skipped, or invalid).
    pub still_failed: usize,
}
