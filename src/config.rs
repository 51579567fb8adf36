//! Run configuration and the optional TOML config file.
//!
//! Precedence, highest first: CLI flags, config file, built-in defaults.
//! The file is read from `--config PATH` when given, otherwise from
//! `$XDG_CONFIG_HOME/phonecheck/config.toml` or
//! `$HOME/.config/phonecheck/config.toml` if that file exists.
//!
//! ```toml
//! base_url = "http://phone-number-api.com/csv/"
//! batch_size = 5
//! request_timeout_secs = 10
//! interval_ms = 12000
//! max_attempts = 1
//! retry_failed = false
//!
//! [[fields]]
//! name = "status"
//! label = "Status"
//!
//! [[fields]]
//! name = "query"
//! label = "Query"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::lookup::{
    ClientError, DEFAULT_BASE_URL, DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT, HttpLookup, Lookup,
    MAX_ATTEMPTS_LIMIT, RateLimited, RateLimiter, RetryPolicy, Retrying, parse_base_url,
};
use crate::pipeline::DEFAULT_BATCH_SIZE;
use crate::record::{Schema, SchemaError, SchemaField};
use crate::store::ResumePolicy;

/// Largest accepted batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Largest accepted request timeout in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Largest accepted rate-limit interval in milliseconds.
pub const MAX_INTERVAL_MS: u64 = 600_000;

const CONFIG_DIR_NAME: &str = "phonecheck";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A numeric value is outside its accepted range.
    #[error("Invalid config value for `{key}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// Config key.
        key: &'static str,
        /// Rejected value.
        value: u64,
        /// Accepted range, for display.
        expected: &'static str,
    },

    /// The base URL is malformed or not http(s).
    #[error(transparent)]
    BaseUrl(#[from] ClientError),

    /// The `[[fields]]` list does not form a valid schema.
    #[error("Invalid config value for `fields`: {0}")]
    Schema(#[from] SchemaError),
}

/// Everything a pipeline run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the lookup service.
    pub base_url: String,
    /// Output columns and requested API fields.
    pub schema: Schema,
    /// Completed lookups per checkpoint.
    pub batch_size: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Minimum spacing between lookups, measured from the end of the
    /// previous call. Zero disables rate limiting.
    pub interval: Duration,
    /// Which recorded rows are skipped on resume.
    pub resume_policy: ResumePolicy,
    /// Retry behavior for transient lookup failures.
    pub retry_policy: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            schema: Schema::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            resume_policy: ResumePolicy::default(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Builds a config from defaults overlaid with `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any file value is invalid.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        let mut config = Self::default();

        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(fields) = file.fields {
            config.schema = Schema::new(fields)?;
        }
        if let Some(batch_size) = file.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.interval_ms {
            config.interval = Duration::from_millis(ms);
        }
        if let Some(max_attempts) = file.max_attempts {
            config.retry_policy = RetryPolicy::with_max_attempts(max_attempts);
        }
        if file.retry_failed == Some(true) {
            config.resume_policy = ResumePolicy::SuccessfulOnly;
        }
        Ok(config)
    }

    /// Builds the lookup stack for this config:
    /// `Retrying<RateLimited<HttpLookup>>`, with the retry layer only when
    /// more than one attempt is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn lookup_client(&self) -> Result<Box<dyn Lookup>, ClientError> {
        let http = HttpLookup::new(&self.base_url, self.request_timeout)?;
        let limiter = if self.interval.is_zero() {
            debug!("rate limiting disabled");
            RateLimiter::disabled()
        } else {
            debug!(interval_ms = self.interval.as_millis(), "rate limiting enabled");
            RateLimiter::new(self.interval)
        };
        let limited = RateLimited::new(http, Arc::new(limiter));

        if self.retry_policy.is_enabled() {
            debug!(
                max_attempts = self.retry_policy.max_attempts(),
                "retrying transient failures"
            );
            Ok(Box::new(Retrying::new(limited, self.retry_policy.clone())))
        } else {
            Ok(Box::new(limited))
        }
    }
}

/// Values read from the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Base URL of the lookup service.
    pub base_url: Option<String>,
    /// Completed lookups per checkpoint (1..=1000).
    pub batch_size: Option<usize>,
    /// Per-request timeout in seconds (1..=300).
    pub request_timeout_secs: Option<u64>,
    /// Minimum spacing between lookups in milliseconds (0..=600000).
    pub interval_ms: Option<u64>,
    /// Attempts per lookup including the first (1..=10).
    pub max_attempts: Option<u32>,
    /// Look up again identifiers recorded with `API_ERROR` or `REQUEST_FAILED`.
    pub retry_failed: Option<bool>,
    /// Output schema; the last field must be the query echo.
    pub fields: Option<Vec<SchemaField>>,
}

impl FileConfig {
    /// Validates values against the same ranges the CLI enforces.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(batch_size) = self.batch_size
            && !(1..=MAX_BATCH_SIZE).contains(&batch_size)
        {
            return Err(ConfigError::OutOfRange {
                key: "batch_size",
                value: u64::try_from(batch_size).unwrap_or(u64::MAX),
                expected: "1..=1000",
            });
        }
        if let Some(secs) = self.request_timeout_secs
            && !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&secs)
        {
            return Err(ConfigError::OutOfRange {
                key: "request_timeout_secs",
                value: secs,
                expected: "1..=300",
            });
        }
        if let Some(ms) = self.interval_ms
            && ms > MAX_INTERVAL_MS
        {
            return Err(ConfigError::OutOfRange {
                key: "interval_ms",
                value: ms,
                expected: "0..=600000",
            });
        }
        if let Some(attempts) = self.max_attempts
            && !(1..=MAX_ATTEMPTS_LIMIT).contains(&attempts)
        {
            return Err(ConfigError::OutOfRange {
                key: "max_attempts",
                value: u64::from(attempts),
                expected: "1..=10",
            });
        }
        if let Some(base_url) = &self.base_url {
            parse_base_url(base_url)?;
        }
        if let Some(fields) = &self.fields {
            Schema::new(fields.clone())?;
        }
        Ok(())
    }
}

/// Parses and validates config file contents.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
/// the validation error for out-of-range values.
pub fn parse_config_str(raw: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    let config: FileConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Reads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
/// [`parse_config_str`].
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config_str(&raw, path)?;
    info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Loads the config file named on the command line, or the default one if
/// it exists. Returns defaults when neither applies.
///
/// # Errors
///
/// An explicit path must exist and be valid; a default-path file must be
/// valid if present.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.is_file() => load_file_config(&path),
        Some(path) => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(FileConfig::default())
        }
        None => Ok(FileConfig::default()),
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/phonecheck/config.toml`
/// 2. `$HOME/.config/phonecheck/config.toml`
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

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
