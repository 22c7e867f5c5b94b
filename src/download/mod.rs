//! Image download pipeline: validation, naming, retrying fetch, and the
//! failure ledger.
//!
//! # Features
//!
//! - Host and extension allowlist checked before any request
//! - Optional `{prefix}{number}_{basename}` naming with a run-wide cursor
//! - Idempotent: an existing target file is skipped without a request
//! - Streaming downloads with partial-file cleanup on error
//! - Bounded retry with a fixed delay (3 attempts, 2 s by default)
//! - Failure ledger with a bulk retry pass that heals on success
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::{
//!     DownloadEngine, DownloadOutcome, FileNamer, HttpClient, HttpTimeouts, RetryPolicy,
//!     UrlValidator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(HttpTimeouts::default())?;
//! let mut engine = DownloadEngine::new(
//!     client,
//!     "./downloaded_images",
//!     UrlValidator::any_host(),
//!     FileNamer::new("img_", true, 1, 3),
//!     RetryPolicy::default(),
//! );
//! match engine.download("https://example.com/wp-content/uploads/a.jpg").await {
//!     DownloadOutcome::Downloaded { filename, .. } => println!("saved {filename}"),
//!     other => println!("{other}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod filename;
mod ledger;
mod outcome;
mod retry;
mod validate;

pub use client::{HttpClient, HttpTimeouts};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, IMAGE_TIMEOUT_SECS,
    PAGE_TIMEOUT_SECS,
};
pub use engine::DownloadEngine;
pub use error::DownloadError;
pub use filename::FileNamer;
pub use ledger::FailureLedger;
pub use outcome::{DownloadOutcome, DownloadStats, InvalidReason, RetrySummary};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
pub use validate::{UrlValidator, ValidationError};
