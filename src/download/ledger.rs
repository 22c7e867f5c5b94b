//! Ordered, duplicate-free list of URLs whose downloads failed terminally.

use serde::Serialize;

/// Failure ledger: URLs that exhausted their attempts, in first-failure
/// order.
///
/// A URL appears at most once. Entries leave the ledger when a later
/// download of the same URL succeeds or is rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureLedger {
    urls: Vec<String>,
}

impl FailureLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `url` unless already present. Returns true when added.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.contains(url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    /// Removes `url` if present. Returns true when removed.
    pub fn remove(&mut self, url: &str) -> bool {
        let Some(index) = self.urls.iter().position(|entry| entry == url) else {
            return false;
        };
        self.urls.remove(index);
        true
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|entry| entry == url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Copy of the current entries, for iteration while the ledger changes.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.urls.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}
