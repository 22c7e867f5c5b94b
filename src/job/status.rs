//! Snapshot-readable job status.
//!
//! One writer (the task running the job) publishes through a
//! `tokio::sync::watch` channel; any number of readers clone the latest
//! snapshot whenever they like.

use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use tokio::sync::watch;

use crate::download::DownloadEngine;

/// Number of log entries kept; older entries are dropped first.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Lifecycle phase of the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// A run is processing input URLs.
    Running,
    /// A retry pass over failed images is in progress.
    Retrying,
    /// The last run or retry pass completed.
    Finished,
    /// The last run or retry pass stopped on request.
    Cancelled,
    /// The last run stopped on a run-level error.
    Aborted,
}

/// Point-in-time view of the runner, safe to read at any moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub phase: JobPhase,
    pub running: bool,
    /// Number of input URLs in the run.
    pub total: usize,
    /// 1-based index of the input URL being processed.
    pub current_index: usize,
    pub current_url: Option<String>,
    /// Images found on the current input URL (1 for a direct image).
    pub found_images: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub invalid: usize,
    /// Terminal failures so far, including ones later recovered.
    pub total_failed: usize,
    /// Current size of the failure ledger.
    pub currently_failed: usize,
    /// Most recent events, oldest first, each prefixed `[HH:MM:SS]`.
    pub log: VecDeque<String>,
    pub output_dir: Option<PathBuf>,
    pub failed_images: Vec<String>,
    /// Why the last run aborted.
    pub error: Option<String>,
}

impl JobStatus {
    /// Appends a timestamped entry, dropping the oldest beyond the cap.
    pub(crate) fn push_log(&mut self, message: impl AsRef<str>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.log.push_back(format!("[{stamp}] {}", message.as_ref()));
        while self.log.len() > MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    /// Copies counters and the failure list from the engine.
    pub(crate) fn sync_engine(&mut self, engine: &DownloadEngine) {
        let stats = engine.stats();
        self.downloaded = stats.downloaded();
        self.skipped = stats.skipped();
        self.invalid = stats.invalid();
        self.total_failed = stats.total_failed();
        self.currently_failed = engine.currently_failed();
        self.failed_images = engine.ledger().snapshot();
    }
}

/// Single-writer publisher of [`JobStatus`] snapshots.
#[derive(Debug)]
pub(crate) struct StatusBoard {
    tx: watch::Sender<JobStatus>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(JobStatus::default());
        Self { tx }
    }
}

impl StatusBoard {
    pub(crate) fn snapshot(&self) -> JobStatus {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.tx.subscribe()
    }

    /// Applies `update` and notifies subscribers.
    pub(crate) fn update(&self, update: impl FnOnce(&mut JobStatus)) {
        self.tx.send_modify(update);
    }

    pub(crate) fn log(&self, message: impl AsRef<str>) {
        self.update(|status| status.push_log(message));
    }
}
