//! # Asset Cache Library
//!
//! This library assembles JavaScript and CSS files that textually include one
//! another and caches the result on disk, so that repeated requests (from
//! the same process or from others) only redo work when something actually
//! changed. It is used by the `asset-cache` command-line tool and is meant to
//! sit underneath an HTTP layer that serves the content and its cache headers.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use asset_cache::config::Settings;
//! use asset_cache::factory::AssetFactory;
//! use asset_cache::filesystem::MemoryFS;
//!
//! let fs = MemoryFS::new();
//! fs.add_file_string("/site/main.js", "/*# include: common.js */\nconsole.log(1);").unwrap();
//! fs.add_file_string("/site/common.js", "var x = 1;").unwrap();
//!
//! let settings = Settings::new("/site", None);
//! let factory = AssetFactory::with_filesystem(settings, Arc::new(fs)).unwrap();
//!
//! let mut asset = factory.create("/site/main.js").unwrap();
//! assert!(asset.content().unwrap().contains("var x = 1;\nconsole.log(1);"));
//! assert_eq!(asset.dependencies().unwrap().len(), 2);
//! ```
//!
//! ## Core Concepts
//!
//! - **Directives (`directive`)**: whole-line comments such as
//!   `/*# include: common.js */` that control resolution.
//! - **Assets (`asset`)**: a source file plus its resolved content, the
//!   flattened set of files it includes and the set of files it depends on.
//! - **Factory (`factory`)**: picks the asset kind by extension and shares one
//!   resolution context across an include tree.
//! - **Cache (`cache`)**: per-asset cache files whose header records the
//!   configuration fingerprint and every dependency, so freshness is decided
//!   without reparsing.
//! - **Loader (`loader`)**: retries the whole initialize sequence on transient
//!   I/O contention instead of locking.
//!
//! ## Execution Flow
//!
//! 1.  **Create**: the factory validates the path and builds a script or style
//!     asset.
//! 2.  **Load**: the raw text is read once.
//! 3.  **Check**: an existing cache file's header is read and freshness is
//!     evaluated against the current fingerprint and dependency timestamps.
//! 4.  **Resolve**: on a miss, directives are processed and includes are
//!     resolved recursively, with self-inclusion and cycles rejected.
//! 5.  **Persist**: the output is minified if enabled and written back to the
//!     cache.

pub mod asset;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod directive;
pub mod error;
pub mod factory;
pub mod filesystem;
pub mod loader;
pub mod minify;
pub mod path;

#[cfg(test)]
mod path_proptest;
