//! TOML file configuration for CLI defaults.
//!
//! The file lives at `$XDG_CONFIG_HOME/image-harvester/config.toml`, or
//! `$HOME/.config/image-harvester/config.toml` when `XDG_CONFIG_HOME` is
//! unset. Every key is optional; command-line flags override file values,
//! which override built-in defaults.
//!
//! ```toml
//! output_dir = "/data/images"
//! allowed_hosts = ["example.com", "cdn.example.net"]
//! page_timeout_secs = 10
//! image_timeout_secs = 15
//! max_attempts = 3
//! retry_delay_ms = 2000
//! ```

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::{HttpTimeouts, RetryPolicy};

const CONFIG_DIR_NAME: &str = "image-harvester";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors reading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys or wrong types.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its allowed range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        expected: &'static str,
    },
}

/// File-backed defaults. Absent keys leave the built-in default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    /// Default host allowlist (subdomains included).
    pub allowed_hosts: Option<Vec<String>>,
    /// Connect timeout in seconds (1..=3600).
    pub connect_timeout_secs: Option<u64>,
    /// Page fetch timeout in seconds (1..=3600).
    pub page_timeout_secs: Option<u64>,
    /// Image fetch timeout in seconds (1..=3600).
    pub image_timeout_secs: Option<u64>,
    /// Attempts per image including the first (1..=10).
    pub max_attempts: Option<u32>,
    /// Pause between attempts in milliseconds (0..=60000).
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    /// Parses and validates config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] (with `path` as given) for syntax,
    /// type or unknown-key errors and [`ConfigError::OutOfRange`] for
    /// values outside their ranges.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every present value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] for the first offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("page_timeout_secs", self.page_timeout_secs)?;
        validate_timeout_secs("image_timeout_secs", self.image_timeout_secs)?;

        if let Some(attempts) = self.max_attempts
            && !(1..=10).contains(&attempts)
        {
            return Err(ConfigError::OutOfRange {
                field: "max_attempts",
                value: u64::from(attempts),
                expected: "1..=10",
            });
        }

        if let Some(delay) = self.retry_delay_ms
            && delay > 60_000
        {
            return Err(ConfigError::OutOfRange {
                field: "retry_delay_ms",
                value: delay,
                expected: "0..=60000",
            });
        }
        Ok(())
    }

    /// Request timeouts with file values applied over the defaults.
    #[must_use]
    pub fn timeouts(&self) -> HttpTimeouts {
        let defaults = HttpTimeouts::default();
        HttpTimeouts {
            connect: self
                .connect_timeout_secs
                .map_or(defaults.connect, Duration::from_secs),
            page: self
                .page_timeout_secs
                .map_or(defaults.page, Duration::from_secs),
            image: self
                .image_timeout_secs
                .map_or(defaults.image, Duration::from_secs),
        }
    }

    /// Retry policy with file values applied over the defaults.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::fixed(
            self.max_attempts.unwrap_or(defaults.max_attempts()),
            self.retry_delay_ms
                .map_or(defaults.delay(), Duration::from_millis),
        )
    }
}

fn validate_timeout_secs(field: &'static str, value: Option<u64>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "1..=3600",
        });
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/image-harvester/config.toml`
/// 2. `$HOME/.config/image-harvester/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if a file is there.
///
/// # Errors
///
/// Propagates [`load_file_config`] errors for an existing file.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };

    if !path_ref.exists() {
        debug!(path = %path_ref.display(), "no config file");
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    debug!(path = %path_ref.display(), "config file loaded");
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

/// Reads, parses and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, otherwise the
/// errors of [`FileConfig::from_toml_str`].
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::from_toml_str(&raw, path)
}
