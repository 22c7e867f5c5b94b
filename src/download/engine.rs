//! Download engine: validate, name, fetch with retry, persist.
//!
//! This module provides the [`DownloadEngine`], which owns everything that
//! changes during a run: counters, the naming cursor, and the failure
//! ledger. Each call to [`DownloadEngine::download`] handles one image URL
//! from start to finish and always returns a [`DownloadOutcome`].
//!
//! # Retry Behavior
//!
//! - Transport failures (timeouts, connection errors, non-2xx status,
//!   interrupted bodies) are retried per the [`RetryPolicy`]
//! - Local I/O failures are terminal at once
//! - A non-image `Content-Type` ends the call as `Invalid` without retry
//! - The filename is derived once per call; retries write to the same path
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{
//!     DownloadEngine, FileNamer, HttpClient, HttpTimeouts, RetryPolicy, UrlValidator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(HttpTimeouts::default())?;
//! let mut engine = DownloadEngine::new(
//!     client,
//!     "./downloaded_images",
//!     UrlValidator::new(["example.com"]),
//!     FileNamer::default(),
//!     RetryPolicy::default(),
//! );
//! let outcome = engine
//!     .download("https://example.com/wp-content/uploads/2024/01/a.jpg")
//!     .await;
//! println!("{outcome}");
//! let summary = engine.retry_all().await;
//! println!("{} recovered, {} still failing", summary.succeeded, summary.still_failed);
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{content_type, stream_to_file};
use super::filename::basename_from_decoded;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use super::validate::referer_for;
use super::{
    DownloadError, DownloadOutcome, DownloadStats, FailureLedger, FileNamer, HttpClient,
    InvalidReason, RetrySummary, UrlValidator, ValidationError,
};

/// Result of a single successful transport exchange.
enum FetchResult {
    Written(u64),
    NotAnImage(Option<String>),
}

/// Retrying, idempotent image downloader with a failure ledger.
///
/// The engine is not shared between tasks; the job runner hands it to one
/// worker at a time.
#[derive(Debug)]
pub struct DownloadEngine {
    client: HttpClient,
    output_dir: PathBuf,
    validator: UrlValidator,
    namer: FileNamer,
    retry_policy: RetryPolicy,
    stats: DownloadStats,
    ledger: FailureLedger,
}

impl DownloadEngine {
    /// Creates an engine writing into `output_dir`.
    ///
    /// The directory must already exist; the job runner creates it before
    /// the first download.
    pub fn new(
        client: HttpClient,
        output_dir: impl Into<PathBuf>,
        validator: UrlValidator,
        namer: FileNamer,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            validator,
            namer,
            retry_policy,
            stats: DownloadStats::new(),
            ledger: FailureLedger::new(),
        }
    }

    /// Returns a copy of the counters.
    #[must_use]
    pub fn stats(&self) -> DownloadStats {
        self.stats
    }

    /// Returns the failure ledger.
    #[must_use]
    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    /// Returns the live number of failed URLs (the ledger size).
    #[must_use]
    pub fn currently_failed(&self) -> usize {
        self.ledger.len()
    }

    /// Returns the naming state, including the cursor.
    #[must_use]
    pub fn namer(&self) -> &FileNamer {
        &self.namer
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Downloads one image URL.
    ///
    /// Never fails: every path ends in a [`DownloadOutcome`], counters are
    /// updated, and the ledger reflects the result (`Failed` adds the URL,
    /// `Downloaded` and `Invalid` remove it, `Skipped` leaves it alone).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download(&mut self, url: &str) -> DownloadOutcome {
        let outcome = self.download_inner(url).await;
        self.stats.record(&outcome);

        match &outcome {
            DownloadOutcome::Downloaded {
                filename, bytes, ..
            } => {
                if self.ledger.remove(url) {
                    info!(filename = %filename, "previously failed image recovered");
                }
                info!(filename = %filename, bytes, "image downloaded");
            }
            DownloadOutcome::Skipped { filename, .. } => {
                debug!(filename = %filename, "file exists, skipping");
            }
            DownloadOutcome::Invalid { reason, .. } => {
                self.ledger.remove(url);
                debug!(reason = %reason, "image rejected");
            }
            DownloadOutcome::Failed {
                error, attempts, ..
            } => {
                self.ledger.insert(url);
                warn!(attempts, error = %error, "image download failed");
            }
        }
        outcome
    }

    /// Re-attempts every URL in the failure ledger.
    ///
    /// Equivalent to [`retry_all_with`](Self::retry_all_with) with a callback
    /// that ignores outcomes.
    pub async fn retry_all(&mut self) -> RetrySummary {
        self.retry_all_with(|_, _| ControlFlow::Continue(())).await
    }

    /// Re-attempts every URL in the failure ledger, reporting each outcome.
    ///
    /// Iterates a snapshot of the ledger, so entries removed by a success do
    /// not disturb the pass. The callback sees each outcome together with
    /// the engine state after it; returning [`ControlFlow::Break`] stops the
    /// pass early. Entries that were not downloaded, attempted or not,
    /// count as `still_failed`.
    #[instrument(skip(self, on_outcome), fields(remaining = self.ledger.len()))]
    pub async fn retry_all_with<F>(&mut self, mut on_outcome: F) -> RetrySummary
    where
        F: FnMut(&DownloadOutcome, &Self) -> ControlFlow<()>,
    {
        let snapshot = self.ledger.snapshot();
        let remaining = snapshot.len();
        if remaining == 0 {
            debug!("failure ledger empty, nothing to retry");
            return RetrySummary::default();
        }

        info!(remaining, "retrying failed downloads");
        let mut succeeded = 0;
        for url in &snapshot {
            let outcome = self.download(url).await;
            if outcome.is_downloaded() {
                succeeded += 1;
            }
            if on_outcome(&outcome, &*self).is_break() {
                debug!("retry pass stopped early");
                break;
            }
        }

        let summary = RetrySummary {
            remaining,
            succeeded,
            still_failed: remaining - succeeded,
        };
        info!(
            succeeded = summary.succeeded,
            still_failed = summary.still_failed,
            "retry pass complete"
        );
        summary
    }

    async fn download_inner(&mut self, url: &str) -> DownloadOutcome {
        let decoded = decode_once(url);

        let parsed = match self.validator.validate(&decoded) {
            Ok(parsed) => parsed,
            Err(error) => {
                return DownloadOutcome::Invalid {
                    url: url.to_string(),
                    reason: error.into(),
                };
            }
        };

        let Some(basename) = basename_from_decoded(&decoded) else {
            return DownloadOutcome::Invalid {
                url: url.to_string(),
                reason: ValidationError::UnsupportedExtension {
                    url: url.to_string(),
                }
                .into(),
            };
        };
        let filename = self.namer.next_filename(&basename);
        let file_path = self.output_dir.join(&filename);

        if tokio::fs::try_exists(&file_path).await.unwrap_or(false) {
            return DownloadOutcome::Skipped {
                url: url.to_string(),
                filename,
            };
        }

        self.fetch_with_retry(url, &parsed, filename, &file_path)
            .await
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        parsed: &Url,
        filename: String,
        file_path: &Path,
    ) -> DownloadOutcome {
        let referer = referer_for(parsed);
        let mut attempt: u32 = 1;

        loop {
            match self.fetch_once(parsed.as_str(), &referer, file_path).await {
                Ok(FetchResult::Written(bytes)) => {
                    return DownloadOutcome::Downloaded {
                        url: url.to_string(),
                        filename,
                        bytes,
                    };
                }
                Ok(FetchResult::NotAnImage(content_type)) => {
                    return DownloadOutcome::Invalid {
                        url: url.to_string(),
                        reason: InvalidReason::NotAnImage { content_type },
                    };
                }
                Err(error) => match self.retry_policy.should_retry(classify_error(&error), attempt)
                {
                    RetryDecision::Retry {
                        delay,
                        attempt: next_attempt,
                    } => {
                        warn!(
                            attempt,
                            next_attempt,
                            delay_ms = delay.as_millis(),
                            error = %error,
                            "attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt = next_attempt;
                    }
                    RetryDecision::DoNotRetry { reason } => {
                        debug!(attempt, reason = %reason, "giving up");
                        return DownloadOutcome::Failed {
                            url: url.to_string(),
                            error: error.to_string(),
                            attempts: attempt,
                        };
                    }
                },
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        referer: &str,
        file_path: &Path,
    ) -> Result<FetchResult, DownloadError> {
        let response = self.client.get_image(url, referer).await?;

        let content_type = content_type(&response);
        if !content_type
            .as_deref()
            .is_some_and(|value| value.starts_with("image/"))
        {
            return Ok(FetchResult::NotAnImage(content_type));
        }

        let bytes = stream_to_file(response, url, file_path).await?;
        Ok(FetchResult::Written(bytes))
    }
}

/// Percent-decodes `url` once, falling back to the input when the result
/// is not UTF-8.
fn decode_once(url: &str) -> Cow<'_, str> {
    match urlencoding::decode(url) {
        Ok(decoded) => decoded,
        Err(error) => {
            debug!(url, error = %error, "percent-decoding failed, using original");
            Cow::Borrowed(url)
        }
    }
}
