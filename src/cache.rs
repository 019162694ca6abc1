//! On-disk caching of resolved assets
//!
//! Each resolved asset is persisted to its own file under the configured
//! temp directory:
//!
//! ```text
//! /*# Configuration: <fingerprint> */
//! /*# Reference: <absolute path> | <relative path> */
//! ...
//!
//! <processed content, verbatim>
//! ```
//!
//! The header is enough to decide freshness without reparsing any source:
//! a cache entry is stale when the configuration fingerprint changed, when a
//! referenced file disappeared, or when a referenced file is newer than the
//! cache file itself.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use sha2::{Digest, Sha256};

use crate::defaults::VERSION_STAMP;
use crate::directive::{format_directive, Directive, DirectiveParser, Line};
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::path::cache_file_name;

/// Extension of every cache file
pub const CACHE_EXTENSION: &str = "cache";

/// One dependency of a cached asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub absolute: PathBuf,
    pub relative: String,
}

/// Decoded contents of a cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    pub fingerprint: Option<String>,
    pub references: Vec<Reference>,
    pub body: String,
}

impl CacheEntry {
    pub fn new(fingerprint: &str, references: Vec<Reference>, body: &str) -> Self {
        Self {
            fingerprint: Some(fingerprint.to_string()),
            references,
            body: body.to_string(),
        }
    }

    /// Decode a cache file. Only the header is scanned for directives; the
    /// body after the first empty line is kept verbatim.
    pub fn parse(parser: &DirectiveParser, text: &str) -> Self {
        let (header, body) = text.split_once("\n\n").unwrap_or((text, ""));
        let mut entry = CacheEntry {
            body: body.to_string(),
            ..CacheEntry::default()
        };

        for line in parser.scan(header) {
            match line {
                Line::Directive {
                    directive: Directive::Configuration { fingerprint },
                    ..
                } => entry.fingerprint = Some(fingerprint.to_string()),
                Line::Directive {
                    directive: Directive::Reference { absolute, relative },
                    ..
                } => entry.references.push(Reference {
                    absolute: PathBuf::from(absolute),
                    relative: relative.to_string(),
                }),
                _ => {}
            }
        }

        entry
    }

    /// Encode for writing to disk.
    pub fn render(&self) -> String {
        let mut out = format_directive(
            "Configuration",
            self.fingerprint.as_deref().unwrap_or_default(),
        );
        for reference in &self.references {
            out.push('\n');
            out.push_str(&format_directive(
                "Reference",
                &format!("{} | {}", reference.absolute.display(), reference.relative),
            ));
        }
        out.push_str("\n\n");
        out.push_str(&self.body);
        out
    }
}

/// Cache file location for an asset, or `None` when caching is disabled.
pub fn cache_path(temp_dir: Option<&Path>, asset_path: &Path) -> Option<PathBuf> {
    temp_dir.map(|dir| dir.join(cache_file_name(asset_path)))
}

/// Whether a cached entry must be rebuilt.
///
/// True when the recorded fingerprint differs from `current_fingerprint`,
/// when there is no cache file, or when any reference is missing or newer
/// than the cache file.
pub fn needs_refresh<'a, I>(
    fs: &dyn FileSystem,
    current_fingerprint: &str,
    recorded_fingerprint: Option<&str>,
    cache_path: Option<&Path>,
    references: I,
) -> Result<bool>
where
    I: IntoIterator<Item = &'a Path>,
{
    if recorded_fingerprint != Some(current_fingerprint) {
        debug!("Cache fingerprint changed");
        return Ok(true);
    }

    let Some(cache_path) = cache_path.filter(|p| fs.exists(p)) else {
        return Ok(true);
    };
    let cache_time = fs.modified(cache_path)?;

    for reference in references {
        if !fs.exists(reference) {
            debug!("Referenced file {} no longer exists", reference.display());
            return Ok(true);
        }
        if fs.modified(reference)? > cache_time {
            debug!("Referenced file {} is newer than cache", reference.display());
            return Ok(true);
        }
    }

    Ok(false)
}

/// Write a cache file, creating its directory first.
pub fn persist(fs: &dyn FileSystem, cache_path: &Path, entry: &CacheEntry) -> Result<()> {
    if let Some(parent) = cache_path.parent() {
        fs.create_dir_all(parent).map_err(|e| Error::Cache {
            message: format!("cannot create cache directory {}: {}", parent.display(), e),
        })?;
    }
    fs.write(cache_path, &entry.render())
        .map_err(|e| Error::Cache {
            message: format!("cannot write {}: {}", cache_path.display(), e),
        })?;
    debug!("Wrote cache file {}", cache_path.display());
    Ok(())
}

/// Content-independent identity token for conditional HTTP responses.
pub fn etag(relative_path: &str, last_modified: SystemTime) -> String {
    let nanos = last_modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    hasher.update(b"|");
    hasher.update(nanos.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(VERSION_STAMP.as_bytes());
    let digest = hasher.finalize();

    hex::encode(&digest[..16])
}

/// Cache files directly inside `temp_dir`.
pub fn list_entries(fs: &dyn FileSystem, temp_dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(fs
        .list_files(temp_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == CACHE_EXTENSION))
        .collect())
}

/// Delete every cache file in `temp_dir`, returning how many were removed.
pub fn clear(fs: &dyn FileSystem, temp_dir: &Path) -> Result<usize> {
    let entries = list_entries(fs, temp_dir)?;
    for entry in &entries {
        fs.remove_file(entry)?;
    }
    Ok(entries.len())
}
