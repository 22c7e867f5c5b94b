//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use harvester_core::FileConfig;
use harvester_core::job::{DEFAULT_DIGITS, DEFAULT_OUTPUT_DIR, DEFAULT_START_NUMBER, JobConfig};

/// Download images embedded in web pages.
///
/// Give page URLs to crawl for uploaded images, or direct image URLs to
/// download as is. Input comes from --url, --file, --urls, or piped stdin,
/// one URL per line.
#[derive(Parser, Debug)]
#[command(name = "image-harvester")]
#[command(author, version, about)]
#[command(group(ArgGroup::new("input").args(["url", "file", "urls"]).multiple(false)))]
pub struct Args {
    /// Single page or image URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// File with one URL per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Several page or image URLs
    #[arg(short = 'l', long, num_args = 1..)]
    pub urls: Vec<String>,

    /// Output directory [default: config file, else downloaded_images]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Retry failed downloads once the run finishes
    #[arg(short, long)]
    pub retry: bool,

    /// Filename prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Number files sequentially after the prefix (requires --prefix)
    #[arg(short, long)]
    pub numbering: bool,

    /// First sequence number
    #[arg(short, long, default_value_t = DEFAULT_START_NUMBER)]
    pub start: u64,

    /// Zero-padding width of sequence numbers (0-12)
    #[arg(short, long, default_value_t = DEFAULT_DIGITS as u8, value_parser = clap::value_parser!(u8).range(0..=12))]
    pub digits: u8,

    /// Only download images from this host or its subdomains (repeatable)
    #[arg(short = 'a', long = "allow-host", value_name = "HOST")]
    pub allow_hosts: Vec<String>,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Returns true when an input flag was given.
    pub fn has_input_flag(&self) -> bool {
        self.url.is_some() || self.file.is_some() || !self.urls.is_empty()
    }

    /// Builds the run configuration: flags over file config over defaults.
    pub fn job_config(&self, file_config: Option<&FileConfig>) -> JobConfig {
        let output_dir = self
            .output
            .clone()
            .or_else(|| file_config.and_then(|cfg| cfg.output_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let allowed_hosts = if self.allow_hosts.is_empty() {
            file_config
                .and_then(|cfg| cfg.allowed_hosts.clone())
                .unwrap_or_default()
        } else {
            self.allow_hosts.clone()
        };

        let file_config = file_config.cloned().unwrap_or_default();
        let mut config = JobConfig::new(output_dir)
            .with_prefix(self.prefix.clone())
            .with_allowed_hosts(allowed_hosts)
            .with_timeouts(file_config.timeouts())
            .with_retry_policy(file_config.retry_policy());
        config.use_numbering = self.numbering;
        config.start_number = self.start;
        config.digits = usize::from(self.digits);
        config
    }
}
