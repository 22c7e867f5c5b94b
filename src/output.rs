//! End-of-run reporting for the CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use harvester_core::{JobStatus, RetrySummary, RunSummary};
use serde::Serialize;

/// Final report combining the run and the optional retry pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Report {
    pub downloaded: usize,
    pub skipped: usize,
    pub invalid: usize,
    pub total_failed: usize,
    pub currently_failed: usize,
    pub output_dir: PathBuf,
    pub urls_processed: usize,
    pub total_urls: usize,
    pub cancelled: bool,
    pub retry: Option<RetrySummary>,
    pub failed_images: Vec<String>,
}

impl Report {
    /// Counters come from the latest status so a retry pass is reflected.
    pub(crate) fn new(run: &RunSummary, retry: Option<RetrySummary>, status: &JobStatus) -> Self {
        Self {
            downloaded: status.downloaded,
            skipped: status.skipped,
            invalid: status.invalid,
            total_failed: status.total_failed,
            currently_failed: status.currently_failed,
            output_dir: run.output_dir.clone(),
            urls_processed: run.urls_processed,
            total_urls: run.total_urls,
            cancelled: run.cancelled,
            retry,
            failed_images: status.failed_images.clone(),
        }
    }
}

/// Writes the report as pretty JSON.
pub(crate) fn print_json(out: &mut impl Write, report: &Report) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)
}

/// Writes the human-readable summary.
pub(crate) fn print_summary(out: &mut impl Write, report: &Report) -> io::Result<()> {
    if report.cancelled {
        writeln!(
            out,
            "Cancelled after {}/{} URL(s).",
            report.urls_processed, report.total_urls
        )?;
    } else {
        writeln!(out, "Processed {} URL(s).", report.urls_processed)?;
    }
    writeln!(out, "  Downloaded:        {}", report.downloaded)?;
    writeln!(out, "  Skipped (exists):  {}", report.skipped)?;
    writeln!(out, "  Invalid:           {}", report.invalid)?;
    writeln!(out, "  Failed (total):    {}", report.total_failed)?;
    writeln!(out, "  Currently failed:  {}", report.currently_failed)?;
    if let Some(retry) = &report.retry {
        writeln!(
            out,
            "  Retry pass:        {} recovered, {} still failed",
            retry.succeeded, retry.still_failed
        )?;
    }
    writeln!(out, "  Output directory:  {}", report.output_dir.display())?;

    if !report.failed_images.is_empty() {
        writeln!(out, "Failed images:")?;
        for url in &report.failed_images {
            writeln!(out, "  {url}")?;
        }
        if report.retry.is_none() {
            writeln!(out, "Run again with --retry to re-attempt them.")?;
        }
    }
    Ok(())
}

/// Printed when no input was given.
pub(crate) fn print_quick_start_guidance(out: &mut impl Write, stdin_was_empty: bool) -> io::Result<()> {
    if stdin_was_empty {
        writeln!(out, "No URLs found on stdin.")?;
    } else {
        writeln!(out, "No input provided.")?;
    }
    writeln!(out, "Usage examples:")?;
    writeln!(out, "  image-harvester -u https://example.com/gallery/")?;
    writeln!(out, "  image-harvester -f urls.txt -o photos -p trip_ -n")?;
    writeln!(out, "  cat urls.txt | image-harvester --retry")
}
