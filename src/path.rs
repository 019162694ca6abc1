//! Path policy for asset-cache
//!
//! Every comparison between asset paths goes through [`PathKey`], which is
//! slash-normalized, lexically cleaned and lowercased. Comparison is
//! therefore case-insensitive on every platform.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

/// Longest sanitized prefix kept in a cache file name
const MAX_CACHE_NAME_PREFIX: usize = 150;

/// Normalized identity of an asset path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(normalize(&path.as_ref().to_string_lossy()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a path string: backslashes become `/`, `.` segments are
/// dropped, `..` pops a segment and the result is lowercased.
pub fn normalize(path: &str) -> String {
    slash_normalize(path).to_lowercase()
}

/// [`normalize`] without the lowercasing.
pub fn slash_normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let rooted = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Lexically clean a filesystem path without touching the disk.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Remove a `?query` suffix from an include target.
pub fn strip_query(target: &str) -> &str {
    target.split('?').next().unwrap_or(target).trim()
}

/// Resolve an include target against the including asset.
///
/// Targets starting with a separator are rooted at `site_root`; all others
/// are relative to `base_dir`. Any `?query` suffix is ignored.
pub fn resolve_include(base_dir: &Path, site_root: &Path, target: &str) -> PathBuf {
    let target = strip_query(target);
    let joined = if target.starts_with('/') || target.starts_with('\\') {
        site_root.join(target.trim_start_matches(['/', '\\']))
    } else {
        base_dir.join(target)
    };
    clean(&joined)
}

/// Site-relative, `/`-prefixed path of `absolute`.
///
/// Paths outside `site_root` keep their absolute form.
pub fn relative_path(site_root: &Path, absolute: &Path) -> String {
    let root = clean(site_root);
    let absolute = clean(absolute);
    match absolute.strip_prefix(&root) {
        Ok(rest) => {
            let parts: Vec<String> = rest
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", parts.join("/"))
        }
        Err(_) => absolute.to_string_lossy().replace('\\', "/"),
    }
}

/// Encode a path to be filesystem-safe
///
/// Separators, drive colons and other characters that are problematic for
/// filesystems become underscores.
pub fn encode_path(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            // Keep alphanumeric, dots, dashes, underscores as-is
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect()
}

/// Cache file name for an absolute asset path.
///
/// Built from the case-preserving path, so `a.js` and `A.js` on a
/// case-sensitive filesystem never share a cache file. The hash suffix keeps
/// names distinct when two paths encode to the same prefix.
pub fn cache_file_name(path: &Path) -> String {
    let normalized = slash_normalize(&path.to_string_lossy());
    let encoded = encode_path(&normalized);
    let encoded = encoded.trim_start_matches('_');
    let count = encoded.chars().count();
    let prefix: String = encoded
        .chars()
        .skip(count.saturating_sub(MAX_CACHE_NAME_PREFIX))
        .collect();

    let digest = Sha256::digest(normalized.as_bytes());
    let hash = hex::encode(&digest[..6]);

    format!("{}-{}.cache", prefix, hash)
}

/// Insertion-ordered map keyed by normalized path. The first insertion of a
/// key wins; later inserts of the same key are ignored.
#[derive(Debug, Clone)]
pub struct PathMap<V> {
    entries: Vec<(PathKey, V)>,
    index: HashMap<PathKey, usize>,
}

impl<V> Default for PathMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> PathMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is already present. Returns whether it was added.
    pub fn insert(&mut self, key: PathKey, value: V) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        true
    }

    pub fn get(&self, key: &PathKey) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &PathKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V: Clone> PathMap<V> {
    /// Merge `other` into this map, keeping existing entries.
    pub fn merge(&mut self, other: &PathMap<V>) {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone());
        }
    }
}
