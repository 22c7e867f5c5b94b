//! Progress UI (spinner) fed by job status snapshots.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use harvester_core::{JobPhase, JobRunner, JobStatus};
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

/// Decides whether to draw the spinner.
pub(crate) fn should_use_spinner(stderr_is_terminal: bool, quiet: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !quiet && !dumb_terminal
}

/// Returns true when `TERM=dumb`.
pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM").is_ok_and(|term| term == "dumb")
}

/// Spawns the progress UI (spinner) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    runner: JobRunner,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(runner, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(runner: JobRunner, stop: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(status_message(&runner.status()));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

fn status_message(status: &JobStatus) -> String {
    let counters = format!(
        "{} downloaded, {} skipped, {} failed",
        status.downloaded, status.skipped, status.currently_failed
    );
    let host = status
        .current_url
        .as_deref()
        .and_then(|url| Url::parse(url).ok())
        .and_then(|url| url.host_str().map(str::to_string));

    match status.phase {
        JobPhase::Retrying => format!("Retrying failed images... {counters}"),
        _ => {
            let source = host.unwrap_or_else(|| "queue".to_string());
            format!(
                "[{}/{}] {} ({} found) {}",
                status.current_index.min(status.total),
                status.total,
                source,
                status.found_images,
                counters
            )
        }
    }
}
