//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `asset-cache` command-line tool. Each subcommand is defined in its own file
//! to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! Commands that resolve assets share [`SourceArgs`], which turns the
//! settings file and overrides into an [`AssetFactory`].

pub mod build;
pub mod cache;
pub mod completions;
pub mod info;
pub mod tree;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use asset_cache::config::{self, Settings};
use asset_cache::defaults::default_temp_dir;
use asset_cache::factory::AssetFactory;

/// Options shared by every command that resolves assets
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to a YAML settings file.
    #[arg(short, long, value_name = "FILE", env = "ASSET_CACHE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Site root for rooted includes and relative paths.
    ///
    /// Defaults to the settings file's `site_root`, or the current directory.
    #[arg(long, value_name = "DIR")]
    pub site_root: Option<PathBuf>,

    /// Directory holding cache files.
    ///
    /// Defaults to the settings file's `temp_dir`, or the system cache
    /// directory (e.g., `~/.cache/asset-cache` on Linux).
    #[arg(long, value_name = "DIR", env = "ASSET_CACHE_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Resolve without reading or writing cache files
    #[arg(long)]
    pub no_cache: bool,
}

impl SourceArgs {
    /// Merge the settings file with command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.settings {
            Some(path) => config::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => Settings::new(std::env::current_dir()?, None),
        };

        if let Some(site_root) = &self.site_root {
            settings.site_root = site_root.clone();
        }

        settings.temp_dir = if self.no_cache {
            None
        } else {
            self.temp_dir
                .clone()
                .or(settings.temp_dir)
                .or_else(|| Some(default_temp_dir()))
        };

        let cwd = std::env::current_dir()?;
        if settings.site_root.is_relative() {
            settings.site_root = cwd.join(&settings.site_root);
        }
        if let Some(temp_dir) = settings.temp_dir.as_mut().filter(|d| d.is_relative()) {
            *temp_dir = cwd.join(&*temp_dir);
        }

        Ok(settings)
    }

    pub fn factory(&self) -> Result<AssetFactory> {
        Ok(AssetFactory::new(self.settings()?)?)
    }
}
