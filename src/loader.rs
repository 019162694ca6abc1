//! Retry-tolerant loading
//!
//! Several request handlers may touch the same source and cache files at
//! once. Contention is absorbed by retrying the whole initialize sequence
//! after a fixed sleep rather than by locking; only transient I/O errors
//! (see [`Error::is_transient`]) are retried.

use std::path::Path;
use std::thread;

use log::warn;

use crate::config::RetryPolicy;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;

/// Run `op` until it succeeds, fails permanently, or the retry budget runs out.
///
/// `attempts` is the caller's retry counter. It counts failed attempts while
/// retrying and is reset to zero on success.
pub fn with_retry<T, F>(policy: &RetryPolicy, path: &Path, attempts: &mut u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    loop {
        match op() {
            Ok(value) => {
                *attempts = 0;
                return Ok(value);
            }
            Err(Error::Io(source)) if crate::error::is_transient_io(&source) => {
                *attempts += 1;
                if *attempts >= policy.max_attempts {
                    let attempts = std::mem::take(attempts);
                    return Err(Error::RetryExhausted {
                        path: path.to_path_buf(),
                        attempts,
                        source,
                    });
                }
                warn!(
                    "Transient failure on {} (attempt {}/{}): {}",
                    path.display(),
                    attempts,
                    policy.max_attempts,
                    source
                );
                thread::sleep(policy.backoff());
            }
            Err(e) => {
                *attempts = 0;
                return Err(e);
            }
        }
    }
}

/// Read an asset's full text.
///
/// A file that does not exist is an error, never empty content.
pub fn load_text(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    match fs.read_to_string(path) {
        Ok(text) => Ok(text),
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e),
    }
}
