//! Pre-fetch gatekeeping for candidate image URLs.

use thiserror::Error;
use url::Url;

use crate::parser::{IMAGE_EXTENSIONS, image_extension};

/// Reasons a candidate URL is refused before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only input.
    #[error("empty URL")]
    Empty,

    /// The URL could not be parsed.
    #[error("malformed URL: {url}")]
    Malformed {
        /// The rejected input.
        url: String,
    },

    /// The URL has no host component (e.g. `data:` or `file:` URLs).
    #[error("URL has no host: {url}")]
    MissingHost {
        /// The rejected input.
        url: String,
    },

    /// The host is not covered by the allowlist.
    #[error("host not allowed: {host}")]
    HostNotAllowed {
        /// The rejected host, lower-cased.
        host: String,
    },

    /// The last path segment has no extension or one outside the image set.
    #[error("unsupported file extension in {url}")]
    UnsupportedExtension {
        /// The rejected input.
        url: String,
    },
}

/// Host and extension allowlist check for image URLs.
///
/// A host matches an allowlist entry when it equals the entry or is a
/// subdomain of it; comparison is case-insensitive. An empty allowlist
/// permits every host.
///
/// ```
/// use harvester_core::download::UrlValidator;
///
/// let validator = UrlValidator::new(["example.com"]);
/// assert!(validator.is_valid("https://cdn.example.com/wp-content/uploads/a.JPG"));
/// assert!(!validator.is_valid("https://example.org/a.jpg"));
/// assert!(!validator.is_valid("https://example.com/a.svg"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlValidator {
    allowed_hosts: Vec<String>,
}

impl UrlValidator {
    /// Creates a validator for the given host entries.
    ///
    /// Entries are trimmed, lower-cased and stripped of a leading dot; blank
    /// entries are ignored.
    pub fn new<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|host| host.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self { allowed_hosts }
    }

    /// Validator that accepts any host.
    #[must_use]
    pub fn any_host() -> Self {
        Self::default()
    }

    /// Returns the normalized allowlist.
    #[must_use]
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// Validates a candidate URL, returning the parsed form on success.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] that applies, checked in the
    /// order empty, malformed, missing host, host, extension.
    pub fn validate(&self, url: &str) -> Result<Url, ValidationError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let parsed = Url::parse(trimmed).map_err(|_| ValidationError::Malformed {
            url: trimmed.to_string(),
        })?;

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ValidationError::MissingHost {
                url: trimmed.to_string(),
            })?
            .to_lowercase();

        if !self.host_allowed(&host) {
            return Err(ValidationError::HostNotAllowed { host });
        }

        let supported = image_extension(parsed.path())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(ValidationError::UnsupportedExtension {
                url: trimmed.to_string(),
            });
        }

        Ok(parsed)
    }

    /// Returns true when [`validate`](Self::validate) would succeed.
    #[must_use]
    pub fn is_valid(&self, url: &str) -> bool {
        self.validate(url).is_ok()
    }

    fn host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        self.allowed_hosts.iter().any(|entry| {
            host == entry
                || host
                    .strip_suffix(entry.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }
}

/// `{scheme}://{host}/` of a validated URL, used as the `Referer`.
pub(crate) fn referer_for(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}/", url.scheme()),
        None => format!("{}://{host}/", url.scheme()),
    }
}
