//! CLI entry point for the image harvester.

use std::io::{self, IsTerminal, Read};
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{JobRunner, load_default_file_config, parse_url_list};
use tracing::{debug, info, warn};

mod cli;
mod output;
mod progress;

use cli::Args;
use output::Report;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_deref()) {
        debug!(path = %path.display(), "using config file");
    }

    let stdin_is_terminal = io::stdin().is_terminal();
    let input_text = if let Some(url) = &args.url {
        url.clone()
    } else if let Some(path) = &args.file {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read URL file '{}'", path.display()))?
    } else if !args.urls.is_empty() {
        args.urls.join("\n")
    } else if !stdin_is_terminal {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        output::print_quick_start_guidance(&mut io::stdout(), false)?;
        return Ok(());
    };

    let urls = parse_url_list(&input_text);
    if urls.is_empty() {
        if args.has_input_flag() {
            info!("No URLs found in input");
        } else {
            output::print_quick_start_guidance(&mut io::stdout(), true)?;
        }
        return Ok(());
    }

    if args.numbering && args.prefix.is_empty() {
        warn!("--numbering has no effect without --prefix");
    }

    let config = args.job_config(loaded.config.as_ref());
    info!(
        urls = urls.len(),
        output_dir = %config.output_dir.display(),
        "Image harvester starting"
    );

    let runner = JobRunner::new();
    let interrupt_runner = runner.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_runner.cancel();
        }
    });

    let use_spinner = progress::should_use_spinner(
        io::stderr().is_terminal(),
        args.quiet,
        progress::is_dumb_terminal(),
    );

    let (handle, stop) = progress::spawn_progress_ui(use_spinner, runner.clone());
    let run_result = runner.run(urls, config).await;
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = handle {
        let _ = handle.await;
    }
    let summary = run_result?;

    let retry = if args.retry && summary.currently_failed > 0 && !summary.cancelled {
        let (handle, stop) = progress::spawn_progress_ui(use_spinner, runner.clone());
        let retry_result = runner.retry_all_failed().await;
        stop.store(true, Ordering::SeqCst);
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        Some(retry_result?)
    } else {
        None
    };
    interrupt.abort();

    let report = Report::new(&summary, retry, &runner.status());
    let mut stdout = io::stdout().lock();
    if args.json {
        output::print_json(&mut stdout, &report)?;
    } else if !args.quiet {
        output::print_summary(&mut stdout, &report)?;
    }

    Ok(())
}
