//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;
use std::time::Duration;

use harvester_core::{
    DownloadEngine, FileNamer, HttpClient, HttpTimeouts, RetryPolicy, UrlValidator,
};

/// Short timeouts so failing cases finish quickly.
pub fn fast_timeouts() -> HttpTimeouts {
    HttpTimeouts {
        connect: Duration::from_secs(2),
        page: Duration::from_secs(2),
        image: Duration::from_secs(2),
    }
}

/// Three attempts with no pause between them.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::fixed(3, Duration::ZERO)
}

/// Engine over `output_dir` accepting any host, with the given namer.
pub fn engine_with_namer(output_dir: &Path, namer: FileNamer) -> DownloadEngine {
    build_engine(output_dir, namer, fast_retry())
}

/// Engine with plain basename naming and the given retry policy.
pub fn engine_with_policy(output_dir: &Path, retry_policy: RetryPolicy) -> DownloadEngine {
    build_engine(output_dir, FileNamer::new("", false, 1, 3), retry_policy)
}

fn build_engine(output_dir: &Path, namer: FileNamer, retry_policy: RetryPolicy) -> DownloadEngine {
    let client = HttpClient::new(fast_timeouts()).unwrap();
    DownloadEngine::new(
        client,
        output_dir,
        UrlValidator::any_host(),
        namer,
        retry_policy,
    )
}

/// Engine with plain basename naming.
pub fn engine(output_dir: &Path) -> DownloadEngine {
    engine_with_namer(output_dir, FileNamer::new("", false, 1, 3))
}
