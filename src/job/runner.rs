//! Single-flight job runner.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::status::StatusBoard;
use super::{JobConfig, JobError, JobPhase, JobStatus};
use crate::download::{DownloadEngine, DownloadOutcome, DownloadStats, HttpClient, RetrySummary};
use crate::extract::ImageExtractor;
use crate::parser::is_direct_image;

/// Final report of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Outcome counters for the run.
    pub stats: DownloadStats,
    /// Failure ledger size at the end of the run.
    pub currently_failed: usize,
    /// Ledger contents at the end of the run, in failure order.
    pub failed_images: Vec<String>,
    /// Directory the images were written to.
    pub output_dir: PathBuf,
    /// Input URLs handled to completion.
    pub urls_processed: usize,
    /// Input URLs given to the run.
    pub total_urls: usize,
    /// True when the run stopped on a cancel request.
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct RunnerShared {
    running: AtomicBool,
    cancel: AtomicBool,
    status: StatusBoard,
    engine: Mutex<Option<DownloadEngine>>,
}

/// Releases the single-flight flag when dropped.
struct RunGuard {
    shared: Arc<RunnerShared>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }
}

/// Runs harvesting jobs one at a time and publishes their status.
///
/// Clones share state, so a clone can watch or cancel a run started from
/// another.
#[derive(Debug, Clone, Default)]
pub struct JobRunner {
    shared: Arc<RunnerShared>,
}

impl JobRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a job over `urls` on the calling task.
    ///
    /// # Errors
    ///
    /// - [`JobError::AlreadyRunning`] if a run or retry pass is active
    /// - [`JobError::OutputDir`] if the output directory cannot be created
    /// - [`JobError::HttpClient`] if the HTTP client cannot be built
    ///
    /// Per-image failures are reported in the summary, never as errors.
    pub async fn run(&self, urls: Vec<String>, config: JobConfig) -> Result<RunSummary, JobError> {
        let guard = self.acquire()?;
        self.execute(guard, urls, config).await
    }

    /// Starts a job on a new task.
    ///
    /// The single-flight check happens before this returns, so a second
    /// call made while the first run is active fails immediately.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AlreadyRunning`] if a run or retry pass is active.
    pub fn spawn_run(
        &self,
        urls: Vec<String>,
        config: JobConfig,
    ) -> Result<JoinHandle<Result<RunSummary, JobError>>, JobError> {
        let guard = self.acquire()?;
        let runner = self.clone();
        Ok(tokio::spawn(async move {
            runner.execute(guard, urls, config).await
        }))
    }

    /// Re-attempts every failed image of the last run.
    ///
    /// # Errors
    ///
    /// - [`JobError::AlreadyRunning`] if a run or retry pass is active
    /// - [`JobError::NoPreviousRun`] if no run has completed yet
    #[instrument(skip(self))]
    pub async fn retry_all_failed(&self) -> Result<RetrySummary, JobError> {
        let _guard = self.acquire()?;
        let mut slot = self.shared.engine.lock().await;
        let Some(engine) = slot.as_mut() else {
            return Err(JobError::NoPreviousRun);
        };

        let status = &self.shared.status;
        let cancel = &self.shared.cancel;
        let pending = engine.currently_failed();
        status.update(|s| {
            s.phase = JobPhase::Retrying;
            s.running = true;
            s.error = None;
            s.current_url = None;
            s.push_log(format!("Retrying {pending} failed image(s)"));
        });

        let summary = engine
            .retry_all_with(|outcome, engine| {
                status.update(|s| {
                    s.current_url = Some(outcome.url().to_string());
                    s.sync_engine(engine);
                    s.push_log(outcome.to_string());
                });
                if cancel.load(Ordering::SeqCst) {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;

        let cancelled = cancel.load(Ordering::SeqCst);
        status.update(|s| {
            s.phase = if cancelled {
                JobPhase::Cancelled
            } else {
                JobPhase::Finished
            };
            s.running = false;
            s.current_url = None;
            s.sync_engine(engine);
            s.push_log(format!(
                "Retry finished: {} recovered, {} still failed",
                summary.succeeded, summary.still_failed
            ));
        });
        Ok(summary)
    }

    /// Returns the latest status snapshot.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.shared.status.snapshot()
    }

    /// Returns a receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.shared.status.subscribe()
    }

    /// Asks the active run or retry pass to stop after the current item.
    pub fn cancel(&self) {
        if self.is_running() {
            info!("cancellation requested");
            self.shared.cancel.store(true, Ordering::SeqCst);
            self.shared.status.log("Cancellation requested");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Result<RunGuard, JobError> {
        self.shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| JobError::AlreadyRunning)?;
        self.shared.cancel.store(false, Ordering::SeqCst);
        Ok(RunGuard {
            shared: Arc::clone(&self.shared),
        })
    }

    fn cancel_requested(&self) -> bool {
        self.shared.cancel.load(Ordering::SeqCst)
    }

    #[instrument(skip_all, fields(urls = urls.len(), output_dir = %config.output_dir.display()))]
    async fn execute(
        &self,
        _guard: RunGuard,
        urls: Vec<String>,
        config: JobConfig,
    ) -> Result<RunSummary, JobError> {
        let status = &self.shared.status;
        let total = urls.len();
        let output_dir = config.output_dir.clone();

        status.update(|s| {
            *s = JobStatus {
                phase: JobPhase::Running,
                running: true,
                total,
                output_dir: Some(output_dir.clone()),
                ..JobStatus::default()
            };
            s.push_log(format!("Starting run over {total} URL(s)"));
        });
        info!(total, "run started");

        if let Err(source) = tokio::fs::create_dir_all(&output_dir).await {
            let error = JobError::OutputDir {
                path: output_dir,
                source,
            };
            self.abort(&error);
            return Err(error);
        }

        let client = match HttpClient::new(config.timeouts) {
            Ok(client) => client,
            Err(source) => {
                let error = JobError::HttpClient(source);
                self.abort(&error);
                return Err(error);
            }
        };

        let mut engine = DownloadEngine::new(
            client.clone(),
            &output_dir,
            config.validator(),
            config.namer(),
            config.retry_policy.clone(),
        );
        let extractor = ImageExtractor::new(client);

        let mut urls_processed = 0;
        let mut cancelled = false;

        'urls: for (index, url) in urls.iter().enumerate() {
            if self.cancel_requested() {
                cancelled = true;
                break;
            }

            status.update(|s| {
                s.current_index = index + 1;
                s.current_url = Some(url.clone());
                s.found_images = 0;
                s.push_log(format!("Processing {}/{total}: {url}", index + 1));
            });

            if is_direct_image(url) {
                status.update(|s| s.found_images = 1);
                let outcome = engine.download(url).await;
                self.publish_outcome(&outcome, &engine);
            } else {
                let images = extractor.extract_images(url).await;
                let found = images.len();
                status.update(|s| {
                    s.found_images = found;
                    s.push_log(format!("Found {found} image(s)"));
                });

                for image in &images {
                    if self.cancel_requested() {
                        cancelled = true;
                        break 'urls;
                    }
                    let outcome = engine.download(image).await;
                    self.publish_outcome(&outcome, &engine);
                }
            }
            urls_processed += 1;
        }

        let summary = RunSummary {
            stats: engine.stats(),
            currently_failed: engine.currently_failed(),
            failed_images: engine.ledger().snapshot(),
            output_dir: output_dir.clone(),
            urls_processed,
            total_urls: total,
            cancelled,
        };

        status.update(|s| {
            s.phase = if cancelled {
                JobPhase::Cancelled
            } else {
                JobPhase::Finished
            };
            s.running = false;
            s.current_url = None;
            s.sync_engine(&engine);
            s.push_log(format!(
                "{}: {} downloaded, {} skipped, {} invalid, {} failed",
                if cancelled { "Cancelled" } else { "Finished" },
                summary.stats.downloaded(),
                summary.stats.skipped(),
                summary.stats.invalid(),
                summary.currently_failed
            ));
        });

        if cancelled {
            warn!(urls_processed, total, "run cancelled");
        } else {
            info!(
                downloaded = summary.stats.downloaded(),
                skipped = summary.stats.skipped(),
                invalid = summary.stats.invalid(),
                total_failed = summary.stats.total_failed(),
                currently_failed = summary.currently_failed,
                "run finished"
            );
        }

        *self.shared.engine.lock().await = Some(engine);
        Ok(summary)
    }

    fn publish_outcome(&self, outcome: &DownloadOutcome, engine: &DownloadEngine) {
        self.shared.status.update(|s| {
            s.sync_engine(engine);
            s.push_log(outcome.to_string());
        });
    }

    fn abort(&self, error: &JobError) {
        warn!(error = %error, "run aborted");
        let message = error.to_string();
        self.shared.status.update(|s| {
            s.phase = JobPhase::Aborted;
            s.running = false;
            s.push_log(format!("Aborted: {message}"));
            s.error = Some(message);
        });
        debug!("previous engine, if any, kept for retry");
    }
}
