//! Per-run configuration.

use std::path::PathBuf;

use crate::download::{FileNamer, HttpTimeouts, RetryPolicy, UrlValidator};

/// Output directory used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_images";

/// First sequence number when numbering is enabled.
pub const DEFAULT_START_NUMBER: u64 = 1;

/// Zero-padding width of sequence numbers.
pub const DEFAULT_DIGITS: usize = 3;

/// Settings fixed for the duration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    /// Directory images are written to; created if missing.
    pub output_dir: PathBuf,
    /// Filename prefix; empty for none.
    pub prefix: String,
    /// Insert a sequence number after the prefix (only with a prefix).
    pub use_numbering: bool,
    /// First sequence number.
    pub start_number: u64,
    /// Zero-padding width of the sequence number.
    pub digits: usize,
    /// Hosts images may come from (subdomains included); empty for any.
    pub allowed_hosts: Vec<String>,
    /// Page and image request timeouts.
    pub timeouts: HttpTimeouts,
    /// Attempt budget and delay for image downloads.
    pub retry_policy: RetryPolicy,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl JobConfig {
    /// Creates a configuration with defaults for everything but the output
    /// directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: String::new(),
            use_numbering: false,
            start_number: DEFAULT_START_NUMBER,
            digits: DEFAULT_DIGITS,
            allowed_hosts: Vec::new(),
            timeouts: HttpTimeouts::default(),
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enables numbering starting at `start_number`, padded to `digits`.
    #[must_use]
    pub fn with_numbering(mut self, start_number: u64, digits: usize) -> Self {
        self.use_numbering = true;
        self.start_number = start_number;
        self.digits = digits;
        self
    }

    #[must_use]
    pub fn with_allowed_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub(crate) fn validator(&self) -> UrlValidator {
        UrlValidator::new(&self.allowed_hosts)
    }

    pub(crate) fn namer(&self) -> FileNamer {
        FileNamer::new(
            &self.prefix,
            self.use_numbering,
            self.start_number,
            self.digits,
        )
    }
}
