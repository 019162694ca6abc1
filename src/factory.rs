//! # Asset Factory
//!
//! The factory turns paths into [`Asset`]s of the right kind and carries the
//! resolution [`Context`] every asset in an include tree shares: the
//! configuration and its fingerprint, the site root, the cache directory,
//! the retry policy, the filesystem, the minifier registry and the directive
//! parser.
//!
//! Children created while resolving includes receive a clone of their
//! parent's context, so a whole tree is resolved under one fingerprint and
//! one cache location.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::asset::Asset;
use crate::config::{Config, RetryPolicy, Settings};
use crate::directive::DirectiveParser;
use crate::error::Result;
use crate::filesystem::{DiskFS, FileSystem};
use crate::minify::{Minifiers, Minify};
use crate::path::clean;

/// Stylesheet extensions; everything else is treated as script.
const STYLE_EXTENSIONS: &[&str] = &["css"];

/// Concrete asset kind, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Self {
        let is_style = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| STYLE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)));
        if is_style {
            AssetKind::Style
        } else {
            AssetKind::Script
        }
    }

    pub fn minifier<'a>(&self, minifiers: &'a Minifiers) -> &'a dyn Minify {
        match self {
            AssetKind::Script => minifiers.script(),
            AssetKind::Style => minifiers.style(),
        }
    }

    /// Whether `path` of this kind should be minified under `config`.
    ///
    /// Files already named `*.min.<ext>` are left alone.
    pub fn should_minify(&self, config: &Config, path: &Path) -> bool {
        let enabled = match self {
            AssetKind::Script => config.minify_scripts,
            AssetKind::Style => config.minify_styles,
        };
        let already_minified = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.to_ascii_lowercase().ends_with(".min"));
        enabled && !already_minified
    }
}

/// Shared state for resolving one include tree.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub fingerprint: Arc<str>,
    pub site_root: PathBuf,
    pub temp_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub fs: Arc<dyn FileSystem>,
    pub minifiers: Arc<Minifiers>,
    pub parser: Arc<DirectiveParser>,
}

impl Context {
    fn from_settings(settings: Settings, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let fingerprint = settings.config.fingerprint()?;
        Ok(Self {
            config: Arc::new(settings.config),
            fingerprint: fingerprint.into(),
            site_root: clean(&settings.site_root),
            temp_dir: settings.temp_dir,
            retry: settings.retry,
            fs,
            minifiers: Arc::new(Minifiers::default()),
            parser: Arc::new(DirectiveParser::new()?),
        })
    }

    /// Absolute form of `path`; relative paths are taken from the site root.
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            clean(path)
        } else {
            clean(&self.site_root.join(path))
        }
    }
}

/// Builds assets sharing one [`Context`].
#[derive(Debug, Clone)]
pub struct AssetFactory {
    context: Context,
}

impl AssetFactory {
    /// A factory reading from the real filesystem.
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_filesystem(settings, Arc::new(DiskFS))
    }

    /// A factory reading through a custom filesystem.
    pub fn with_filesystem(settings: Settings, fs: Arc<dyn FileSystem>) -> Result<Self> {
        Ok(Self {
            context: Context::from_settings(settings, fs)?,
        })
    }

    /// Replace the default minifier registry.
    pub fn with_minifiers(mut self, minifiers: Minifiers) -> Self {
        self.context.minifiers = Arc::new(minifiers);
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Create a top-level asset. Fails with `NotFound` if the file is missing.
    pub fn create<P: AsRef<Path>>(&self, path: P) -> Result<Asset> {
        create_asset(&self.context, &self.context.absolute(path.as_ref()))
    }

    /// Create and fully initialize a top-level asset.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<Asset> {
        let mut asset = self.create(path)?;
        asset.initialize()?;
        Ok(asset)
    }

    /// Resolve many top-level assets in parallel, one owned asset per task.
    ///
    /// Results are returned in input order.
    pub fn resolve_all<P>(&self, paths: &[P]) -> Vec<Result<Asset>>
    where
        P: AsRef<Path> + Sync,
    {
        paths.par_iter().map(|path| self.resolve(path)).collect()
    }
}

/// Dispatch on extension and build an asset inheriting `context`.
pub(crate) fn create_asset(context: &Context, path: &Path) -> Result<Asset> {
    let kind = AssetKind::from_path(path);
    Asset::new(context.clone(), kind, path.to_path_buf())
}
