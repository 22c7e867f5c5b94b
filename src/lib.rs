//! Image Harvester Core Library
//!
//! This library provides the core functionality for the image harvester,
//! which crawls pages for embedded images and saves them to a local
//! directory, tracking which downloads failed so they can be retried.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Input URL lists and direct-image classification
//! - [`extract`] - Image discovery on crawled HTML pages
//! - [`download`] - Validation, naming, and the retrying download engine
//! - [`job`] - Single-flight job runner with a snapshot status record
//! - [`config`] - TOML file defaults for the CLI

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod extract;
pub mod job;
pub mod parser;
pub(crate) mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{ConfigError, FileConfig, LoadedConfig, load_default_file_config};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DownloadEngine, DownloadError, DownloadOutcome, DownloadStats,
    FailureLedger, FailureType, FileNamer, HttpClient, HttpTimeouts, InvalidReason, RetryDecision,
    RetryPolicy, RetrySummary, UrlValidator, ValidationError, classify_error,
};
pub use extract::{ImageExtractor, UPLOAD_PATH_MARKER, extract_image_urls};
pub use job::{JobConfig, JobError, JobPhase, JobRunner, JobStatus, RunSummary};
pub use parser::{IMAGE_EXTENSIONS, is_direct_image, parse_url_list};
