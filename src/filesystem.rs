//! Filesystem access used by asset resolution
//!
//! Resolution only needs a handful of operations: read, write, stat, delete
//! and listing a cache directory. They sit behind the [`FileSystem`] trait so
//! the real disk ([`DiskFS`]) can be swapped for an in-memory filesystem
//! ([`MemoryFS`]) that makes modification times and transient lock failures
//! deterministic in tests.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::clean;

/// Trait for filesystem operations - allows mocking in tests
pub trait FileSystem: Send + Sync + fmt::Debug {
    /// Read a whole file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or replace a file
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Whether `path` is an existing regular file
    fn exists(&self, path: &Path) -> bool;

    /// Last modification time of a file
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Regular files directly inside `dir`, sorted by path
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// The default implementation of `FileSystem`, backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFS;

impl FileSystem for DiskFS {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Writes go to a temporary sibling that is then persisted over `path`,
    /// so concurrent readers see either the old or the new contents.
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staging = NamedTempFile::new_in(dir)?;
        staging.write_all(contents.as_bytes())?;
        staging.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        Ok(std::fs::metadata(path)?.modified()?)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        Ok(std::fs::remove_file(path)?)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Filesystem {
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Represents a file with content and metadata
#[derive(Debug, Clone)]
pub struct File {
    pub content: String,
    pub modified_time: SystemTime,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<PathBuf, File>,
    /// Remaining injected transient failures per path
    failures: HashMap<PathBuf, u32>,
    /// Logical clock, in seconds past the epoch
    clock: u64,
}

impl MemoryState {
    fn tick(&mut self) -> SystemTime {
        self.clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.clock)
    }

    fn take_failure(&mut self, path: &Path) -> Result<()> {
        if let Some(remaining) = self.failures.get_mut(path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("{} is locked by another process", path.display()),
                )));
            }
        }
        Ok(())
    }
}

/// In-memory filesystem with a logical clock.
///
/// Every write or touch advances the clock by one second, so later writes
/// are always strictly newer. Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "MemoryFS state".to_string(),
        })
    }

    /// Add or replace a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&self, path: P, content: &str) -> Result<()> {
        self.write(path.as_ref(), content)
    }

    /// Bump a file's modification time past everything written so far
    pub fn touch<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = clean(path.as_ref());
        let mut state = self.lock()?;
        let now = state.tick();
        match state.files.get_mut(&path) {
            Some(file) => {
                file.modified_time = now;
                Ok(())
            }
            None => Err(Error::Filesystem {
                message: format!("File not found: {}", path.display()),
            }),
        }
    }

    /// Give a file an explicit modification time without advancing the clock
    pub fn set_modified<P: AsRef<Path>>(&self, path: P, time: SystemTime) -> Result<()> {
        let path = clean(path.as_ref());
        let mut state = self.lock()?;
        match state.files.get_mut(&path) {
            Some(file) => {
                file.modified_time = time;
                Ok(())
            }
            None => Err(Error::Filesystem {
                message: format!("File not found: {}", path.display()),
            }),
        }
    }

    /// Make the next `count` reads of `path` fail with a transient lock error
    pub fn fail_reads<P: AsRef<Path>>(&self, path: P, count: u32) -> Result<()> {
        let path = clean(path.as_ref());
        self.lock()?.failures.insert(path, count);
        Ok(())
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.files.len()).unwrap_or(0)
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileSystem for MemoryFS {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = clean(path);
        let mut state = self.lock()?;
        state.take_failure(&path)?;
        state
            .files
            .get(&path)
            .map(|f| f.content.clone())
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                ))
            })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let path = clean(path);
        let mut state = self.lock()?;
        let modified_time = state.tick();
        state.files.insert(
            path,
            File {
                content: contents.to_string(),
                modified_time,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let path = clean(path);
        self.lock()
            .map(|s| s.files.contains_key(&path))
            .unwrap_or(false)
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let path = clean(path);
        self.lock()?
            .files
            .get(&path)
            .map(|f| f.modified_time)
            .ok_or_else(|| Error::Filesystem {
                message: format!("File not found: {}", path.display()),
            })
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        // Directories are implicit
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let path = clean(path);
        match self.lock()?.files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(Error::Filesystem {
                message: format!("File not found: {}", path.display()),
            }),
        }
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let dir = clean(dir);
        let state = self.lock()?;
        let mut files: Vec<PathBuf> = state
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }
}
