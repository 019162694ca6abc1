//! Default values for asset-cache configuration.
//!
//! This module provides centralized default values used across the library
//! and the commands, ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Total initialize attempts before a transient failure becomes fatal.
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Fixed sleep between initialize attempts.
pub const RETRY_BACKOFF_MS: u64 = 100;

/// Version stamp mixed into every ETag.
pub const VERSION_STAMP: &str = env!("CARGO_PKG_VERSION");

/// Returns the default cache directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/asset-cache` (XDG Base Directory)
/// - macOS: `~/Library/Caches/asset-cache`
/// - Windows: `{FOLDERID_LocalAppData}\asset-cache`
///
/// Falls back to `.asset-cache` in the current directory if the platform
/// cache directory cannot be determined.
///
/// This can be overridden by the `--temp-dir` CLI flag or the
/// `ASSET_CACHE_DIR` environment variable.
pub fn default_temp_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".asset-cache"))
        .join("asset-cache")
}
