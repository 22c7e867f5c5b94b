//! Constants for the download module (timeouts, retry budget).

use std::time::Duration;

/// Default connect timeout shared by page and image requests (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for page fetches (10 seconds).
pub const PAGE_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for image fetches (15 seconds).
pub const IMAGE_TIMEOUT_SECS: u64 = 15;

/// Default number of attempts per image, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
