//! Splitting raw text input into the ordered list of URLs for a run.

use tracing::debug;

/// Splits text into one URL per line.
///
/// Lines are trimmed and empty lines dropped. Order and duplicates are kept:
/// each line is one unit of work for the run, exactly as the user listed it.
#[must_use]
pub fn parse_url_list(input: &str) -> Vec<String> {
    let urls: Vec<String> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    debug!(count = urls.len(), "parsed URL list");
    urls
}
