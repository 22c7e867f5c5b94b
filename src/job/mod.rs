//! Job orchestration: one run at a time over a list of input URLs.
//!
//! The [`JobRunner`] classifies each input URL, crawls pages for images,
//! hands every image to the [`DownloadEngine`](crate::download::DownloadEngine),
//! and publishes a [`JobStatus`] snapshot after each item. The engine is kept
//! after the run so its failures can be retried later with
//! [`JobRunner::retry_all_failed`].
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::job::{JobConfig, JobRunner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = JobRunner::new();
//! let config = JobConfig::new("./downloaded_images")
//!     .with_prefix("trip_")
//!     .with_numbering(1, 3)
//!     .with_allowed_hosts(["example.com"]);
//! let urls = vec!["https://example.com/2024/01/gallery/".to_string()];
//! let summary = runner.run(urls, config).await?;
//! println!("{} downloaded", summary.stats.downloaded());
//! if summary.currently_failed > 0 {
//!     let retry = runner.retry_all_failed().await?;
//!     println!("{} recovered", retry.succeeded);
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod runner;
mod status;

pub use config::{DEFAULT_DIGITS, DEFAULT_OUTPUT_DIR, DEFAULT_START_NUMBER, JobConfig};
pub use error::JobError;
pub use runner::{JobRunner, RunSummary};
pub use status::{JobPhase, JobStatus, MAX_LOG_ENTRIES};
