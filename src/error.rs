//! # Error Handling
//!
//! This module defines the centralized error type for `asset-cache`. It uses
//! the `thiserror` library to build a single `Error` enum covering every
//! failure the resolver can raise, with a `Result<T>` alias used throughout
//! the crate.
//!
//! Errors fall into two groups:
//!
//! - **Fatal** conditions that abort resolution of the whole asset tree:
//!   self-inclusion, indirect inclusion cycles, a missing top-level asset and
//!   exhausting the retry budget on transient I/O.
//! - **Wrapped** errors from collaborators (`std::io`, `serde_json`, `regex`)
//!   converted with `#[from]`.
//!
//! Degraded conditions (a missing include, an unknown directive) are never
//! represented here; they are logged and processing continues. A failed cache
//! write surfaces as [`Error::Cache`] from `cache::persist` and is logged by
//! the asset that attempted it.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for asset-cache operations
#[derive(Error, Debug)]
pub enum Error {
    /// An asset contains an include directive that resolves to itself.
    #[error("Self-inclusion detected: {path} includes itself")]
    SelfInclusion { path: PathBuf },

    /// An asset includes one of its ancestors in the inclusion chain.
    #[error("Recursive inclusion detected: {cycle}")]
    RecursiveInclusion { cycle: String },

    /// A transient I/O failure persisted past the configured retry budget.
    #[error("Gave up on {path} after {attempts} attempts: {source}")]
    RetryExhausted {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// An asset was requested for a path that is not a file on disk.
    #[error("Asset not found: {path}")]
    NotFound { path: PathBuf },

    /// An error occurred while parsing the settings file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A cache file or its directory could not be written.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An error occurred with an in-memory filesystem operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Whether this error is a transient I/O failure that the initialize
    /// loop should absorb by sleeping and retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

/// Classifies an I/O error as transient contention.
///
/// Windows reports another process holding the file as a sharing violation
/// (32) or lock violation (33); elsewhere contention surfaces through the
/// portable kinds below.
pub fn is_transient_io(error: &std::io::Error) -> bool {
    use std::io::ErrorKind;

    if cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33)) {
        return true;
    }

    matches!(
        error.kind(),
        ErrorKind::PermissionDenied
            | ErrorKind::WouldBlock
            | ErrorKind::Interrupted
            | ErrorKind::TimedOut
    )
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
