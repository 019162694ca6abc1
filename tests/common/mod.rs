//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_file("site/main.js", "main();");
//! fixture.command().arg("build").arg(fixture.site("main.js")).assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::sources;
    pub use super::TestFixture;
}

/// Asset sources used across tests.
#[allow(dead_code)]
pub mod sources {
    pub const MAIN_JS: &str = "/*# include: lib/common.js */\nconsole.log(1);";
    pub const COMMON_JS: &str = "var x = 1;";
    pub const CYCLE_A: &str = "/*# include: b.js */\na();";
    pub const CYCLE_B: &str = "/*# include: a.js */\nb();";
    pub const SELF_JS: &str = "/*# include: self.js */\nself();";
    pub const MISSING_JS: &str = "/*# include: gone.js */\nafter();";
}

/// A temporary directory laid out as `site/` (sources) and `cache/` (cache files).
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with empty `site/` and `cache/` directories.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir.child("site").create_dir_all().expect("Failed to create site dir");
        temp_dir.child("cache").create_dir_all().expect("Failed to create cache dir");
        Self { temp_dir }
    }

    /// Add a file with the given path (relative to the fixture root) and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Add the two-file include scenario under `site/`.
    pub fn with_main_scenario(self) -> Self {
        self.with_file("site/main.js", sources::MAIN_JS)
            .with_file("site/lib/common.js", sources::COMMON_JS)
    }

    /// Overwrite a file in place.
    pub fn write(&self, path: &str, content: &str) {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Push a file's modification time forward so it is newer than any cache file.
    pub fn touch(&self, path: &str) {
        let file = std::fs::File::options()
            .write(true)
            .open(self.path().join(path))
            .expect("Failed to open file");
        file.set_modified(SystemTime::now() + Duration::from_secs(60))
            .expect("Failed to set modification time");
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn site_root(&self) -> PathBuf {
        self.path().join("site")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path().join("cache")
    }

    /// Absolute path of a file under `site/`.
    pub fn site(&self, path: &str) -> PathBuf {
        self.site_root().join(path)
    }

    /// Cache files currently on disk.
    pub fn cache_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.cache_dir())
            .map(|entries| entries.flatten().map(|e| e.path()).collect())
            .unwrap_or_default();
        files.sort();
        files
    }

    /// Create a command running in the fixture with site root and cache dir set.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("asset-cache");
        cmd.current_dir(self.path())
            .env_remove("ASSET_CACHE_SETTINGS")
            .env_remove("RUST_LOG")
            .env("ASSET_CACHE_DIR", self.cache_dir())
            .arg("--log-level")
            .arg("warn");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
