//! Run-level errors. Per-image problems are outcomes, not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a run or retry pass from starting or continuing.
#[derive(Debug, Error)]
pub enum JobError {
    /// Another run or retry pass holds the runner.
    #[error("a job is already running")]
    AlreadyRunning,

    /// Retry was requested before any run completed.
    #[error("no previous run to retry failures from")]
    NoPreviousRun,

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory that was requested.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to initialize HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
