//! # Configuration
//!
//! Two layers of configuration drive asset resolution:
//!
//! - **`Config`** holds every setting that changes the bytes an asset
//!   resolves to (minification switches, markup escaping). Its compact JSON
//!   serialization is the *fingerprint* recorded in every cache file; a change
//!   to any field invalidates all previously cached output.
//! - **`Settings`** wraps a `Config` together with runtime values that do not
//!   affect output: the site root, the cache directory and the retry policy.
//!
//! Settings are usually read from a YAML file:
//!
//! ```yaml
//! site_root: ./public
//! temp_dir: /var/tmp/asset-cache
//! retry:
//!   max_attempts: 5
//!   backoff_ms: 100
//! config:
//!   minify_scripts: true
//!   minify_styles: true
//!   escape_markup: true
//! ```
//!
//! Relative `site_root` and `temp_dir` values are resolved against the
//! directory containing the settings file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Settings that affect produced content and form the cache fingerprint.
///
/// Field order is part of the fingerprint format; append new fields at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Run the script minifier on `.js` assets
    #[serde(default = "default_true")]
    pub minify_scripts: bool,

    /// Run the style minifier on `.css` assets
    #[serde(default = "default_true")]
    pub minify_styles: bool,

    /// Escape `<` and `/>` in source text before directive scanning
    #[serde(default = "default_true")]
    pub escape_markup: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minify_scripts: true,
            minify_styles: true,
            escape_markup: true,
        }
    }
}

impl Config {
    /// Serialized form recorded in cache files.
    pub fn fingerprint(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Bounded retry used around asset initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed sleep between attempts, in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    defaults::RETRY_MAX_ATTEMPTS
}

fn default_backoff_ms() -> u64 {
    defaults::RETRY_BACKOFF_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            backoff_ms: defaults::RETRY_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    /// A policy with no sleep between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_ms: 0,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Runtime settings for a resolution context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Root that rooted include paths and site-relative paths are based on
    #[serde(default = "default_site_root")]
    pub site_root: PathBuf,

    /// Directory holding cache files; caching is disabled when absent
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub config: Config,
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_root: default_site_root(),
            temp_dir: None,
            retry: RetryPolicy::default(),
            config: Config::default(),
        }
    }
}

impl Settings {
    /// Settings rooted at `site_root` with caching into `temp_dir`.
    pub fn new(site_root: impl Into<PathBuf>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            site_root: site_root.into(),
            temp_dir,
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn resolve_relative_to(mut self, base: &Path) -> Self {
        if self.site_root.is_relative() {
            self.site_root = base.join(&self.site_root);
        }
        if let Some(dir) = self.temp_dir.take() {
            self.temp_dir = Some(if dir.is_relative() { base.join(dir) } else { dir });
        }
        self
    }
}

/// Parse settings from a YAML string.
///
/// An empty document yields the default settings.
pub fn parse(yaml_content: &str) -> Result<Settings> {
    if yaml_content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings: Settings = serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        let hint = if message.contains("unknown field") {
            Some(
                "valid top-level keys are site_root, temp_dir, retry and config".to_string(),
            )
        } else {
            None
        };
        Error::ConfigParse { message, hint }
    })?;

    if settings.retry.max_attempts == 0 {
        return Err(Error::ConfigParse {
            message: "retry.max_attempts must be at least 1".to_string(),
            hint: None,
        });
    }

    Ok(settings)
}

/// Parse settings from a YAML file, resolving relative paths against the
/// file's directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(parse(&content)?.resolve_relative_to(base))
}
