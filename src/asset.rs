//! # Assets
//!
//! An [`Asset`] is one script or stylesheet identified by its absolute path.
//! Resolving it produces the final content with every `include` directive
//! inlined, plus two flattened sets:
//!
//! - the **include set**: every file inlined anywhere in the tree, mapped to
//!   its resolved child asset (or `None` when the target was missing);
//! - the **reference set**: every file whose modification must invalidate the
//!   cached output, always including the asset itself.
//!
//! ## Lifecycle
//!
//! 1.  The [`AssetFactory`](crate::factory::AssetFactory) creates the asset;
//!     the file must exist.
//! 2.  The first access to content, sets or timestamps runs `initialize`.
//! 3.  `initialize` loads the raw text once, reads the header of an existing
//!     cache file and, if the cache is still fresh, serves the cached body.
//! 4.  Otherwise the source is rescanned, includes are resolved
//!     recursively, the result is optionally minified and the cache file is
//!     rewritten.
//!
//! The whole sequence is retried on transient I/O failures.
//!
//! ## Cycle detection
//!
//! Children never point back at their parents. Instead each recursive
//! resolution receives the chain of ancestor keys, and an include whose
//! target appears in that chain (or equals the asset itself) is fatal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, error, warn};

use crate::cache::{self, CacheEntry, Reference};
use crate::directive::{escape_markup, Directive, Line, FILE_NOT_FOUND_MARKER};
use crate::error::{Error, Result};
use crate::factory::{create_asset, AssetKind, Context};
use crate::loader;
use crate::path::{self, PathKey, PathMap};

/// Include set: target key to resolved child, `None` for a missing target.
pub type Includes = PathMap<Option<Arc<Asset>>>;

/// Reference set: dependency key to its absolute and relative paths.
pub type References = PathMap<Reference>;

/// A script or stylesheet and its resolution state.
#[derive(Debug)]
pub struct Asset {
    context: Context,
    kind: AssetKind,
    path: PathBuf,
    key: PathKey,
    relative_path: String,
    cache_path: Option<PathBuf>,
    minify: bool,
    raw: Option<String>,
    content: Option<String>,
    /// Fingerprint the current content was produced under
    fingerprint: Option<String>,
    includes: Includes,
    /// Keys of includes written directly in this asset, in order
    direct_includes: Vec<PathKey>,
    references: References,
    initialized: bool,
    from_cache: bool,
    attempts: u32,
}

/// Recursive view of an include tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeNode {
    pub path: PathBuf,
    pub relative_path: String,
    /// The include target did not exist
    pub missing: bool,
    pub children: Vec<IncludeNode>,
}

impl Asset {
    pub(crate) fn new(context: Context, kind: AssetKind, path: PathBuf) -> Result<Self> {
        if !context.fs.exists(&path) {
            return Err(Error::NotFound { path });
        }

        let key = PathKey::new(&path);
        let relative_path = path::relative_path(&context.site_root, &path);
        let cache_path = cache::cache_path(context.temp_dir.as_deref(), &path);
        let minify = kind.should_minify(&context.config, &path);

        Ok(Self {
            context,
            kind,
            path,
            key,
            relative_path,
            cache_path,
            minify,
            raw: None,
            content: None,
            fingerprint: None,
            includes: PathMap::new(),
            direct_includes: Vec::new(),
            references: PathMap::new(),
            initialized: false,
            from_cache: false,
            attempts: 0,
        })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &PathKey {
        &self.key
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the current content was served from the cache file.
    pub fn is_from_cache(&self) -> bool {
        self.from_cache
    }

    /// Fingerprint recorded for the current content.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Unprocessed source text.
    pub fn raw_content(&mut self) -> Result<&str> {
        if self.raw.is_none() {
            let retry = self.context.retry;
            let path = self.path.clone();
            let mut attempts = self.attempts;
            let raw = loader::with_retry(&retry, &path, &mut attempts, || {
                loader::load_text(self.context.fs.as_ref(), &path)
            });
            self.attempts = attempts;
            self.raw = Some(raw?);
        }
        Ok(self.raw.as_deref().unwrap_or_default())
    }

    /// Fully resolved, possibly minified content.
    pub fn content(&mut self) -> Result<&str> {
        self.ensure_initialized()?;
        Ok(self.content.as_deref().unwrap_or_default())
    }

    /// Flattened include set.
    pub fn includes(&mut self) -> Result<&Includes> {
        self.ensure_initialized()?;
        Ok(&self.includes)
    }

    /// Flattened reference set.
    pub fn references(&mut self) -> Result<&References> {
        self.ensure_initialized()?;
        Ok(&self.references)
    }

    /// Absolute paths of every file this asset depends on, itself included.
    pub fn dependencies(&mut self) -> Result<Vec<PathBuf>> {
        Ok(self
            .references()?
            .values()
            .map(|r| r.absolute.clone())
            .collect())
    }

    /// The cache file's timestamp, or the newest dependency when uncached.
    pub fn last_modified(&mut self) -> Result<SystemTime> {
        self.ensure_initialized()?;
        let fs = self.context.fs.as_ref();

        if let Some(cache_path) = self.cache_path.as_deref().filter(|p| fs.exists(p)) {
            return fs.modified(cache_path);
        }

        let mut newest = SystemTime::UNIX_EPOCH;
        for reference in self.references.values() {
            if fs.exists(&reference.absolute) {
                newest = newest.max(fs.modified(&reference.absolute)?);
            }
        }
        Ok(newest)
    }

    pub fn etag(&mut self) -> Result<String> {
        let last_modified = self.last_modified()?;
        Ok(cache::etag(&self.relative_path, last_modified))
    }

    /// Whether the cache state loaded by the last initialize is stale.
    pub fn needs_refresh(&self) -> Result<bool> {
        cache::needs_refresh(
            self.context.fs.as_ref(),
            &self.context.fingerprint,
            self.fingerprint.as_deref(),
            self.cache_path.as_deref(),
            self.references.values().map(|r| r.absolute.as_path()),
        )
    }

    /// Tree of includes as written, recursing into resolved children.
    pub fn include_tree(&mut self) -> Result<IncludeNode> {
        self.ensure_initialized()?;
        Ok(self.build_include_node())
    }

    fn build_include_node(&self) -> IncludeNode {
        let children = self
            .direct_includes
            .iter()
            .filter_map(|key| match self.includes.get(key) {
                Some(Some(child)) => Some(child.build_include_node()),
                Some(None) => Some(IncludeNode {
                    path: PathBuf::from(key.as_str()),
                    relative_path: key.to_string(),
                    missing: true,
                    children: Vec::new(),
                }),
                None => None,
            })
            .collect();

        IncludeNode {
            path: self.path.clone(),
            relative_path: self.relative_path.clone(),
            missing: false,
            children,
        }
    }

    /// Delete this asset's cache file. Returns whether one was removed.
    pub fn invalidate(&self) -> Result<bool> {
        let fs = self.context.fs.as_ref();
        match self.cache_path.as_deref() {
            Some(cache_path) if fs.exists(cache_path) => {
                fs.remove_file(cache_path)?;
                debug!("Invalidated cache file {}", cache_path.display());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn ensure_initialized(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialize()
    }

    /// Resolve this asset as the root of an include tree.
    ///
    /// Always re-evaluates cache freshness; repeated calls against unchanged
    /// files produce identical content and dependencies.
    pub fn initialize(&mut self) -> Result<()> {
        self.initialize_within(&[])
    }

    /// Resolve with the given ancestor chain, retrying transient failures.
    pub(crate) fn initialize_within(&mut self, ancestors: &[PathKey]) -> Result<()> {
        let retry = self.context.retry;
        let path = self.path.clone();
        let mut attempts = self.attempts;
        let result = loader::with_retry(&retry, &path, &mut attempts, || {
            self.try_initialize(ancestors)
        });
        self.attempts = attempts;
        result
    }

    fn try_initialize(&mut self, ancestors: &[PathKey]) -> Result<()> {
        self.initialized = false;
        self.from_cache = false;
        self.fingerprint = None;
        self.includes.clear();
        self.direct_includes.clear();
        self.references.clear();

        let raw = self.raw_source()?;

        if let Some(body) = self.read_cache()? {
            if !self.needs_refresh()? {
                debug!("Serving {} from cache", self.path.display());
                self.content = Some(body);
                self.from_cache = true;
                self.initialized = true;
                return Ok(());
            }
            debug!("Cache for {} is stale", self.path.display());
        }

        self.fingerprint = None;
        self.references.clear();

        let mut content = self.process(&raw, ancestors)?;
        if self.minify {
            content = self.kind.minifier(&self.context.minifiers).minify(&content);
        }

        self.fingerprint = Some(self.context.fingerprint.to_string());
        self.content = Some(content);
        self.persist();
        self.initialized = true;
        Ok(())
    }

    /// Memoized raw text; loading happens inside the caller's retry loop.
    fn raw_source(&mut self) -> Result<String> {
        if self.raw.is_none() {
            self.raw = Some(loader::load_text(self.context.fs.as_ref(), &self.path)?);
        }
        Ok(self.raw.clone().unwrap_or_default())
    }

    /// Load fingerprint and references from an existing cache file and
    /// return its body. Nothing is inlined or minified on this pass.
    ///
    /// A cache file that cannot be read or decoded counts as absent, so the
    /// asset is rebuilt and the file rewritten. Transient errors still
    /// propagate to the retry loop.
    fn read_cache(&mut self) -> Result<Option<String>> {
        let fs = self.context.fs.as_ref();
        let Some(cache_path) = self.cache_path.as_deref().filter(|p| fs.exists(p)) else {
            return Ok(None);
        };

        let text = match fs.read_to_string(cache_path) {
            Ok(text) => text,
            Err(e) if e.is_transient() => return Err(e),
            Err(e) => {
                warn!(
                    "Ignoring unreadable cache file {} for {}: {}",
                    cache_path.display(),
                    self.path.display(),
                    e
                );
                return Ok(None);
            }
        };
        let entry = CacheEntry::parse(&self.context.parser, &text);

        self.fingerprint = entry.fingerprint;
        for reference in entry.references {
            self.references.insert(PathKey::new(&reference.absolute), reference);
        }
        Ok(Some(entry.body))
    }

    /// Scan `raw` for directives and build the output text.
    fn process(&mut self, raw: &str, ancestors: &[PathKey]) -> Result<String> {
        let text = if self.context.config.escape_markup {
            escape_markup(raw)
        } else {
            raw.to_string()
        };

        let parser = Arc::clone(&self.context.parser);
        let mut output: Vec<String> = Vec::new();

        for line in parser.scan(&text) {
            match line {
                Line::Text(text) => output.push(text.to_string()),
                Line::Directive { directive, raw } => match directive {
                    Directive::Include { target } => {
                        output.push(self.resolve_include(target, raw, ancestors)?);
                    }
                    Directive::Reference { absolute, relative } => {
                        self.add_reference(PathBuf::from(absolute), relative.to_string());
                    }
                    Directive::Configuration { fingerprint } => {
                        self.fingerprint = Some(fingerprint.to_string());
                    }
                    Directive::Unknown { name, .. } => {
                        warn!(
                            "Unknown directive '{}' in {}",
                            name,
                            self.path.display()
                        );
                    }
                },
            }
        }

        self.add_reference(self.path.clone(), self.relative_path.clone());
        Ok(output.join("\n"))
    }

    fn add_reference(&mut self, absolute: PathBuf, relative: String) {
        let key = PathKey::new(&absolute);
        self.references.insert(key, Reference { absolute, relative });
    }

    /// Resolve one include directive into the text that replaces it.
    fn resolve_include(&mut self, target: &str, raw: &str, ancestors: &[PathKey]) -> Result<String> {
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("/"));
        let resolved = path::resolve_include(base_dir, &self.context.site_root, target);
        let key = PathKey::new(&resolved);

        if key == self.key {
            return Err(Error::SelfInclusion {
                path: self.path.clone(),
            });
        }

        if let Some(position) = ancestors.iter().position(|a| *a == key) {
            let cycle = ancestors[position..]
                .iter()
                .chain([&self.key, &key])
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(Error::RecursiveInclusion { cycle });
        }

        if !self.context.fs.exists(&resolved) {
            error!(
                "Included file {} not found (included from {})",
                resolved.display(),
                self.path.display()
            );
            self.includes.insert(key.clone(), None);
            self.direct_includes.push(key);
            return Ok(format!("{} {}", raw, FILE_NOT_FOUND_MARKER));
        }

        let mut child = create_asset(&self.context, &resolved)?;
        let mut chain = ancestors.to_vec();
        chain.push(self.key.clone());
        child.initialize_within(&chain)?;

        let content = child.content.clone().unwrap_or_default();
        self.includes.merge(&child.includes);
        self.references.merge(&child.references);
        self.includes.insert(key.clone(), Some(Arc::new(child)));
        self.direct_includes.push(key);

        Ok(content)
    }

    /// Write the cache file. Failures are logged; the in-memory result stays valid.
    fn persist(&self) {
        let Some(cache_path) = self.cache_path.as_deref() else {
            return;
        };

        let entry = CacheEntry {
            fingerprint: self.fingerprint.clone(),
            references: self.references.values().cloned().collect(),
            body: self.content.clone().unwrap_or_default(),
        };

        if let Err(e) = cache::persist(self.context.fs.as_ref(), cache_path, &entry) {
            error!("Cache for {} not persisted: {}", self.path.display(), e);
        }
    }
}
